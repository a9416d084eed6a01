// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Export snapshot assembly.
//!
//! The [`SnapshotBuilder`] turns the current subscription set into flat
//! export records. Values are read back synchronously from each
//! subscription at export time rather than taken from the live value
//! store: the snapshot trades a little latency for freshness, matching
//! the reference behavior. A snapshot is not linearizable across tags -
//! rows may be read at slightly different instants - but each row's value
//! and timestamp come from the same reading.

use std::sync::Arc;

use tagbridge_core::client::TagServerClient;
use tagbridge_core::error::{EngineError, EngineResult};
use tagbridge_core::types::ExportRecord;

use crate::connection::ConnectionManager;
use crate::registry::SubscriptionRegistry;

/// Value written for a reading the server returned without a value.
const MISSING_VALUE: &str = "N/A";

// =============================================================================
// SnapshotBuilder
// =============================================================================

/// Assembles point-in-time export snapshots of the subscribed tags.
pub struct SnapshotBuilder<C> {
    connection: Arc<ConnectionManager<C>>,
    registry: Arc<SubscriptionRegistry<C>>,
}

impl<C: TagServerClient> SnapshotBuilder<C> {
    /// Creates a builder over the given connection and registry.
    pub fn new(
        connection: Arc<ConnectionManager<C>>,
        registry: Arc<SubscriptionRegistry<C>>,
    ) -> Self {
        Self {
            connection,
            registry,
        }
    }

    /// Builds one export record per subscribed tag.
    ///
    /// An empty registry yields an empty sequence ("nothing to export",
    /// not an error). A failed read-back of an individual tag is logged
    /// and skipped; records already collected for other tags are kept.
    ///
    /// # Errors
    ///
    /// - [`EngineError::NotConnected`] - no active connection
    pub async fn build_snapshot(&self, server_name: &str) -> EngineResult<Vec<ExportRecord>> {
        if !self.connection.is_connected() {
            return Err(EngineError::NotConnected);
        }

        let handles = self.registry.snapshot().await;
        if handles.is_empty() {
            return Ok(Vec::new());
        }

        let client = self.connection.client();
        let mut records = Vec::with_capacity(handles.len());

        for handle in handles {
            let readings = {
                let client = client.lock().await;
                client.read_subscription(handle.client_subscription).await
            };

            let readings = match readings {
                Ok(readings) => readings,
                Err(e) => {
                    let error =
                        EngineError::tag_read(handle.tag_id.as_str(), e.to_string());
                    tracing::warn!(
                        tag_id = %handle.tag_id,
                        error = %error,
                        "skipping tag in export snapshot"
                    );
                    continue;
                }
            };

            for reading in readings {
                let value = reading
                    .value
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| MISSING_VALUE.to_string());
                records.push(ExportRecord::new(
                    server_name,
                    reading.item_id,
                    value,
                    reading.timestamp,
                ));
            }
        }

        tracing::info!(server = server_name, count = records.len(), "built export snapshot");
        Ok(records)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use tagbridge_core::notify::notification_channel;
    use tagbridge_core::types::{ServerDescriptor, SubscriptionConfig, TagId, Value, ROOT_BRANCH};
    use tagbridge_sim::{SimNamespace, SimTagServer};

    use crate::connection::ConnectionManager;
    use crate::store::LiveValueStore;

    struct Fixture {
        server: SimTagServer,
        registry: Arc<SubscriptionRegistry<SimTagServer>>,
        builder: SnapshotBuilder<SimTagServer>,
    }

    async fn fixture() -> Fixture {
        let server = SimTagServer::new(SimNamespace::demo());
        let connection = Arc::new(ConnectionManager::new(server.clone()));
        connection
            .connect(&ServerDescriptor::new("Sim.1"), Duration::from_secs(1))
            .await
            .unwrap();

        let store = Arc::new(LiveValueStore::new());
        let (tx, _rx) = notification_channel(64);
        let registry = Arc::new(SubscriptionRegistry::new(
            Arc::clone(&connection),
            store,
            SubscriptionConfig::default(),
            tx,
        ));
        let builder = SnapshotBuilder::new(connection, Arc::clone(&registry));

        Fixture {
            server,
            registry,
            builder,
        }
    }

    #[tokio::test]
    async fn test_empty_registry_empty_snapshot() {
        let f = fixture().await;
        let records = f.builder.build_snapshot("Sim.1").await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_branch_and_tag_derivation() {
        let f = fixture().await;
        f.registry
            .subscribe(TagId::new("Area1.Temp"), "Temp")
            .await
            .unwrap();
        f.registry
            .subscribe(TagId::new("Area1.Pressure"), "Pressure")
            .await
            .unwrap();
        f.registry
            .subscribe(TagId::new("Status"), "Status")
            .await
            .unwrap();

        let records = f.builder.build_snapshot("Sim.1").await.unwrap();
        assert_eq!(records.len(), 3);

        let temp = records.iter().find(|r| r.tag_name == "Temp").unwrap();
        assert_eq!(temp.branch_name, "Area1");
        assert_eq!(temp.tag_id.as_str(), "Area1.Temp");

        let pressure = records.iter().find(|r| r.tag_name == "Pressure").unwrap();
        assert_eq!(pressure.branch_name, "Area1");

        let status = records.iter().find(|r| r.tag_name == "Status").unwrap();
        assert_eq!(status.branch_name, ROOT_BRANCH);
    }

    #[tokio::test]
    async fn test_reads_back_live_not_cached() {
        let f = fixture().await;
        let id = TagId::new("Area1.Temp");
        f.registry.subscribe(id.clone(), "Temp").await.unwrap();

        // The store still holds the pending placeholder, but the server
        // value moved on; the snapshot reads the fresh value.
        f.server.push_value("Area1.Temp", Value::Float64(80.25)).await;

        let records = f.builder.build_snapshot("Sim.1").await.unwrap();
        assert_eq!(records[0].value, "80.25");
    }

    #[tokio::test]
    async fn test_failed_tag_skipped_others_kept() {
        let f = fixture().await;
        f.registry
            .subscribe(TagId::new("Area1.Temp"), "Temp")
            .await
            .unwrap();
        f.registry
            .subscribe(TagId::new("Area2.Flow"), "Flow")
            .await
            .unwrap();

        f.server.fail_read(TagId::new("Area1.Temp"));

        let records = f.builder.build_snapshot("Sim.1").await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].tag_id.as_str(), "Area2.Flow");
    }

    #[tokio::test]
    async fn test_snapshot_requires_connection() {
        let server = SimTagServer::new(SimNamespace::demo());
        let connection = Arc::new(ConnectionManager::new(server));
        let store = Arc::new(LiveValueStore::new());
        let (tx, _rx) = notification_channel(8);
        let registry = Arc::new(SubscriptionRegistry::new(
            Arc::clone(&connection),
            store,
            SubscriptionConfig::default(),
            tx,
        ));
        let builder = SnapshotBuilder::new(connection, registry);

        assert!(matches!(
            builder.build_snapshot("Sim.1").await,
            Err(EngineError::NotConnected)
        ));
    }
}
