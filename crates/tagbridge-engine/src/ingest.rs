// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Notification ingestion.
//!
//! A single task drains the engine's inbound notification channel and
//! applies each batch through the subscription registry. The delivery
//! side (the external client) may push from any number of tasks at any
//! time; everything funnels through the one channel, decoupling the
//! store from the client's scheduling model.
//!
//! A malformed or late notification is dropped, never escalated: the
//! ingestion path must outlive any individual bad input.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use tokio::task::JoinHandle;

use tagbridge_core::client::TagServerClient;
use tagbridge_core::notify::NotificationReceiver;

use crate::registry::SubscriptionRegistry;

// =============================================================================
// IngestStats
// =============================================================================

/// Lock-free counters for the ingestion task.
#[derive(Debug, Default)]
pub struct IngestStats {
    batches: AtomicU64,
    applied: AtomicU64,
    dropped: AtomicU64,
}

impl IngestStats {
    /// Creates zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a point-in-time copy of the counters.
    pub fn snapshot(&self) -> IngestStatsSnapshot {
        IngestStatsSnapshot {
            batches: self.batches.load(Ordering::Relaxed),
            applied: self.applied.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }

    fn record(&self, applied: usize, dropped: usize) {
        self.batches.fetch_add(1, Ordering::Relaxed);
        self.applied.fetch_add(applied as u64, Ordering::Relaxed);
        self.dropped.fetch_add(dropped as u64, Ordering::Relaxed);
    }
}

/// Point-in-time ingestion counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestStatsSnapshot {
    /// Batches received.
    pub batches: u64,
    /// Notifications applied to the store.
    pub applied: u64,
    /// Notifications dropped (unregistered tag or stale timestamp).
    pub dropped: u64,
}

// =============================================================================
// Ingest Task
// =============================================================================

/// Spawns the drain task for the engine's notification channel.
///
/// The task holds only a weak registry handle: the engine keeps the
/// strong references, so dropping the engine releases the channel senders
/// and lets the task exit instead of keeping the registry alive.
pub fn spawn_ingest<C>(
    registry: Weak<SubscriptionRegistry<C>>,
    mut rx: NotificationReceiver,
    stats: Arc<IngestStats>,
) -> JoinHandle<()>
where
    C: TagServerClient + 'static,
{
    tokio::spawn(async move {
        while let Some(batch) = rx.recv().await {
            let Some(registry) = registry.upgrade() else {
                break;
            };
            let size = batch.len();
            let (applied, dropped) = registry.ingest(batch).await;
            stats.record(applied, dropped);
            tracing::trace!(size, applied, dropped, "ingested change batch");
        }
        tracing::debug!("notification channel closed, ingest task exiting");
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use tagbridge_core::notify::notification_channel;
    use tagbridge_core::types::{ServerDescriptor, SubscriptionConfig, TagId, Value};
    use tagbridge_sim::{SimNamespace, SimTagServer};

    use crate::connection::ConnectionManager;
    use crate::store::LiveValueStore;

    #[tokio::test]
    async fn test_ingest_task_applies_batches() {
        let server = SimTagServer::new(SimNamespace::demo());
        let connection = Arc::new(ConnectionManager::new(server.clone()));
        connection
            .connect(&ServerDescriptor::new("Sim.1"), Duration::from_secs(1))
            .await
            .unwrap();

        let store = Arc::new(LiveValueStore::new());
        let (tx, rx) = notification_channel(64);
        let registry = Arc::new(SubscriptionRegistry::new(
            Arc::clone(&connection),
            Arc::clone(&store),
            SubscriptionConfig::default(),
            tx,
        ));
        let stats = Arc::new(IngestStats::new());
        let task = spawn_ingest(Arc::downgrade(&registry), rx, Arc::clone(&stats));

        let id = TagId::new("Area1.Temp");
        registry.subscribe(id.clone(), "Temp").await.unwrap();
        server.push_value("Area1.Temp", Value::Float64(74.1)).await;

        // Wait for the drain task to catch up.
        tokio::time::timeout(Duration::from_secs(1), async {
            loop {
                if let Some(live) = store.read(&id) {
                    if !live.is_pending() {
                        break;
                    }
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("value never reached the store");

        assert_eq!(store.read(&id).unwrap().value, "74.1");
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.batches, 1);
        assert_eq!(snapshot.applied, 1);

        // Detach everything and drop the strong references; the task must
        // exit on its own.
        registry.unsubscribe_all().await;
        drop(registry);
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("ingest task did not exit")
            .unwrap();
    }
}
