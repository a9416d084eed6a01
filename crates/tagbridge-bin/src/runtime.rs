// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Bridge runtime orchestration.
//!
//! Wires configuration, the simulated tag server, and the engine into the
//! `run` command: enumerate servers, connect, subscribe the startup tags,
//! log live values as they change, and write an export snapshot on the
//! way out. A background ticker nudges the simulated process values so
//! the live store has real churn to aggregate.

use std::collections::HashMap;
use std::time::Duration;

use rand::Rng;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use tagbridge_config::BridgeConfig;
use tagbridge_core::client::ServerEnumerator;
use tagbridge_core::types::{ServerDescriptor, TagId, Value};
use tagbridge_engine::Engine;
use tagbridge_sim::{SimNamespace, SimServerCatalog, SimTagServer};

use crate::cli::RunArgs;
use crate::error::{BinError, BinResult};
use crate::shutdown::ShutdownCoordinator;

// =============================================================================
// BridgeRuntime
// =============================================================================

/// Drives one bridge session from connect to export.
pub struct BridgeRuntime {
    config: BridgeConfig,
    shutdown: ShutdownCoordinator,
}

impl BridgeRuntime {
    /// Creates a runtime for the given configuration.
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            config,
            shutdown: ShutdownCoordinator::new(),
        }
    }

    /// Returns a handle for triggering shutdown externally.
    pub fn shutdown_handle(&self) -> ShutdownCoordinator {
        self.shutdown.clone()
    }

    /// Runs until a shutdown signal or the optional deadline, then
    /// exports a snapshot and tears the engine down.
    pub async fn run(self, args: RunArgs) -> BinResult<()> {
        info!("starting tagbridge v{}", tagbridge_core::VERSION);

        // Forward OS signals into the shutdown broadcast.
        {
            let shutdown = self.shutdown.clone();
            tokio::spawn(async move { shutdown.wait_for_signal().await });
        }

        let catalog = SimServerCatalog::new();
        let servers = catalog
            .list_servers()
            .await
            .map_err(|e| BinError::discovery(e.to_string()))?;
        info!(count = servers.len(), "enumerated tag servers");

        let descriptor = ServerDescriptor::new(&self.config.server.name);
        if !servers.iter().any(|s| s.name == descriptor.name) {
            warn!(server = %descriptor, "configured server not in enumeration; trying anyway");
        }

        let server = SimTagServer::new(SimNamespace::demo());
        let engine = Engine::with_config(
            server.clone(),
            self.config.subscription.to_subscription_config(),
            self.config.subscription.channel_capacity,
        );

        engine
            .connect(&descriptor, self.config.server.connect_timeout())
            .await?;

        let branches = engine.list_branches(None).await?;
        info!(
            server = %descriptor,
            branches = branches.len(),
            "connected and browsed namespace"
        );
        for branch in &branches {
            debug!(branch = %branch.name, "discovered branch");
        }

        let subscribed = self.subscribe_startup_tags(&engine, &branches).await?;
        if subscribed.is_empty() {
            warn!("no tags subscribed; the live store will stay empty");
        }

        let ticker = spawn_value_ticker(
            server,
            subscribed,
            self.config.subscription.to_subscription_config().update_rate,
            self.shutdown.subscribe(),
        );

        self.main_loop(&engine, &args).await;
        self.shutdown.initiate();
        let _ = ticker.await;

        let records = engine.build_snapshot(&self.config.server.name).await?;
        write_export(&records, &args)?;

        engine.shutdown().await?;
        info!("tagbridge shutdown complete");
        Ok(())
    }

    /// Subscribes the configured startup tags, or everything under the
    /// first branch when none are configured. A tag that fails to
    /// subscribe is reported and skipped.
    async fn subscribe_startup_tags(
        &self,
        engine: &Engine<SimTagServer>,
        branches: &[tagbridge_core::types::BranchNode],
    ) -> BinResult<Vec<TagId>> {
        let mut wanted: Vec<TagId> = self
            .config
            .startup
            .subscribe
            .iter()
            .map(|s| TagId::new(s.as_str()))
            .collect();

        if wanted.is_empty() {
            if let Some(first) = branches.first() {
                let tags = engine.list_tags(&first.name).await?;
                wanted = tags.into_iter().map(|t| t.item_id).collect();
            }
        }

        let mut subscribed = Vec::with_capacity(wanted.len());
        for tag_id in wanted {
            let display = tag_id.leaf_name().to_string();
            match engine.subscribe(tag_id.clone(), display).await {
                Ok(_) => subscribed.push(tag_id),
                Err(e) => warn!(tag_id = %tag_id, error = %e, "failed to subscribe"),
            }
        }

        info!(count = subscribed.len(), "startup subscriptions registered");
        Ok(subscribed)
    }

    /// Logs live values periodically until shutdown or deadline.
    async fn main_loop(&self, engine: &Engine<SimTagServer>, args: &RunArgs) {
        let mut shutdown_rx = self.shutdown.subscribe();
        let mut display = tokio::time::interval(Duration::from_secs(2));

        let deadline = async {
            match args.duration_secs {
                Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("shutdown requested");
                    break;
                }
                _ = &mut deadline => {
                    info!("run duration elapsed");
                    break;
                }
                _ = display.tick() => {
                    for (tag_id, live) in engine.read_all() {
                        info!(tag_id = %tag_id, value = %live.value, "live value");
                    }
                }
            }
        }
    }
}

/// Writes the export snapshot as JSON to the requested target.
fn write_export(
    records: &[tagbridge_core::types::ExportRecord],
    args: &RunArgs,
) -> BinResult<()> {
    let json =
        serde_json::to_string_pretty(records).map_err(|e| BinError::output(e.to_string()))?;

    match &args.export {
        Some(path) => {
            std::fs::write(path, json)
                .map_err(|e| BinError::output(format!("{}: {}", path.display(), e)))?;
            info!(path = %path.display(), records = records.len(), "export snapshot written");
        }
        None => println!("{}", json),
    }
    Ok(())
}

/// Random-walks the simulated process values so subscriptions have
/// something to report.
fn spawn_value_ticker(
    server: SimTagServer,
    tags: Vec<TagId>,
    period: Duration,
    mut shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut levels: HashMap<TagId, f64> =
            tags.into_iter().map(|tag| (tag, 50.0)).collect();
        let mut interval = tokio::time::interval(period);

        loop {
            tokio::select! {
                _ = shutdown.recv() => break,
                _ = interval.tick() => {
                    for (tag, level) in levels.iter_mut() {
                        let delta: f64 = rand::thread_rng().gen_range(-0.5..0.5);
                        *level += delta;
                        let rounded = (*level * 100.0).round() / 100.0;
                        server.push_value(tag.clone(), Value::Float64(rounded)).await;
                    }
                }
            }
        }
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_to_completion_with_deadline() {
        let config = BridgeConfig::default();
        let runtime = BridgeRuntime::new(config);

        let export = std::env::temp_dir().join("tagbridge_runtime_test_export.json");
        let args = RunArgs {
            duration_secs: Some(0),
            export: Some(export.clone()),
        };

        runtime.run(args).await.unwrap();

        let contents = std::fs::read_to_string(&export).unwrap();
        let records: Vec<serde_json::Value> = serde_json::from_str(&contents).unwrap();
        // The default config subscribes everything under the first branch.
        assert_eq!(records.len(), 2);
        let _ = std::fs::remove_file(&export);
    }
}
