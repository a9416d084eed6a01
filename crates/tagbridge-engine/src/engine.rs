// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Engine facade.
//!
//! [`Engine`] wires the connection manager, namespace browser,
//! subscription registry, live value store, ingestion task, and snapshot
//! builder into one component with a single teardown order:
//!
//! 1. detach notification listeners and dispose subscriptions
//! 2. clear registry and store
//! 3. release the connection
//!
//! Reversing that order could dispose a session while subscriptions still
//! reference it, leaking server-side handles.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use tagbridge_core::client::TagServerClient;
use tagbridge_core::error::EngineResult;
use tagbridge_core::notify::{notification_channel, DEFAULT_CHANNEL_CAPACITY};
use tagbridge_core::types::{
    BranchNode, ConnectionState, ExportRecord, LiveValue, ServerDescriptor, SubscriptionConfig,
    TagDescriptor, TagId,
};

use crate::browser::NamespaceBrowser;
use crate::connection::ConnectionManager;
use crate::export::SnapshotBuilder;
use crate::ingest::{spawn_ingest, IngestStats, IngestStatsSnapshot};
use crate::registry::{SubscriptionHandle, SubscriptionRegistry};
use crate::store::LiveValueStore;

// =============================================================================
// Engine
// =============================================================================

/// The tag subscription and live data aggregation engine.
///
/// One engine instance manages one server connection. Subscribe and
/// unsubscribe calls are expected to be serialized by the caller (they
/// are user-initiated); change notifications and reads may run
/// concurrently with everything else.
pub struct Engine<C: TagServerClient + 'static> {
    connection: Arc<ConnectionManager<C>>,
    browser: NamespaceBrowser<C>,
    registry: Arc<SubscriptionRegistry<C>>,
    store: Arc<LiveValueStore>,
    exporter: SnapshotBuilder<C>,
    ingest_stats: Arc<IngestStats>,
    ingest_task: JoinHandle<()>,
}

impl<C: TagServerClient + 'static> Engine<C> {
    /// Creates an engine with default subscription settings.
    pub fn new(client: C) -> Self {
        Self::with_config(client, SubscriptionConfig::default(), DEFAULT_CHANNEL_CAPACITY)
    }

    /// Creates an engine with explicit subscription settings and
    /// notification channel capacity.
    pub fn with_config(
        client: C,
        config: SubscriptionConfig,
        channel_capacity: usize,
    ) -> Self {
        let connection = Arc::new(ConnectionManager::new(client));
        let store = Arc::new(LiveValueStore::new());
        let (ingest_tx, ingest_rx) = notification_channel(channel_capacity);

        let registry = Arc::new(SubscriptionRegistry::new(
            Arc::clone(&connection),
            Arc::clone(&store),
            config,
            ingest_tx,
        ));

        let ingest_stats = Arc::new(IngestStats::new());
        let ingest_task = spawn_ingest(
            Arc::downgrade(&registry),
            ingest_rx,
            Arc::clone(&ingest_stats),
        );

        let browser = NamespaceBrowser::new(Arc::clone(&connection));
        let exporter = SnapshotBuilder::new(Arc::clone(&connection), Arc::clone(&registry));

        Self {
            connection,
            browser,
            registry,
            store,
            exporter,
            ingest_stats,
            ingest_task,
        }
    }

    // =========================================================================
    // Connection
    // =========================================================================

    /// Connects to the named server with an explicit deadline.
    pub async fn connect(
        &self,
        server: &ServerDescriptor,
        timeout: Duration,
    ) -> EngineResult<()> {
        self.connection.connect(server, timeout).await?;
        Ok(())
    }

    /// Tears down every subscription, then releases the connection.
    ///
    /// Idempotent: disconnecting a disconnected engine is a no-op.
    pub async fn disconnect(&self) -> EngineResult<()> {
        self.registry.unsubscribe_all().await;
        self.connection.disconnect().await
    }

    /// Returns `true` if connected.
    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    /// Returns the connection state.
    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Returns the session generation for staleness checks.
    pub fn generation(&self) -> u64 {
        self.connection.generation()
    }

    // =========================================================================
    // Browsing
    // =========================================================================

    /// Lists branches under `parent`, or the top-level branches.
    pub async fn list_branches(&self, parent: Option<&str>) -> EngineResult<Vec<BranchNode>> {
        self.browser.list_branches(parent).await
    }

    /// Lists the leaf tags directly under `branch`.
    pub async fn list_tags(&self, branch: &str) -> EngineResult<Vec<TagDescriptor>> {
        self.browser.list_tags(branch).await
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    /// Subscribes a tag for change delivery.
    pub async fn subscribe(
        &self,
        tag_id: impl Into<TagId>,
        display_name: impl Into<String>,
    ) -> EngineResult<SubscriptionHandle> {
        self.registry.subscribe(tag_id.into(), display_name).await
    }

    /// Removes a tag's subscription; a silent no-op for unknown tags.
    pub async fn unsubscribe(&self, tag_id: &TagId) -> bool {
        self.registry.unsubscribe(tag_id).await
    }

    /// Removes every subscription.
    pub async fn unsubscribe_all(&self) {
        self.registry.unsubscribe_all().await
    }

    /// Returns the number of registered subscriptions.
    pub async fn subscription_count(&self) -> usize {
        self.registry.count().await
    }

    /// Returns the current `(tag, subscription)` pairs.
    pub async fn subscriptions(&self) -> Vec<SubscriptionHandle> {
        self.registry.snapshot().await
    }

    // =========================================================================
    // Live values
    // =========================================================================

    /// Returns the latest known value for a tag.
    pub fn read(&self, tag_id: &TagId) -> Option<LiveValue> {
        self.store.read(tag_id)
    }

    /// Returns all live values, ordered by tag identifier.
    pub fn read_all(&self) -> Vec<(TagId, LiveValue)> {
        self.store.read_all()
    }

    /// Returns ingestion counters.
    pub fn ingest_stats(&self) -> IngestStatsSnapshot {
        self.ingest_stats.snapshot()
    }

    // =========================================================================
    // Export
    // =========================================================================

    /// Builds a point-in-time export snapshot of all subscribed tags.
    pub async fn build_snapshot(&self, server_name: &str) -> EngineResult<Vec<ExportRecord>> {
        self.exporter.build_snapshot(server_name).await
    }

    // =========================================================================
    // Shutdown
    // =========================================================================

    /// Shuts the engine down: detaches listeners, disposes subscriptions,
    /// clears registry and store, releases the connection, and waits for
    /// the ingestion task to drain out.
    pub async fn shutdown(self) -> EngineResult<()> {
        let Engine {
            connection,
            browser,
            registry,
            store,
            exporter,
            ingest_stats,
            ingest_task,
        } = self;

        registry.unsubscribe_all().await;
        let result = connection.disconnect().await;

        // Dropping the registry (and the exporter's handle to it) releases
        // the last notification sender; the drain task then sees the
        // channel close and exits.
        drop(exporter);
        drop(browser);
        drop(registry);
        drop(store);
        drop(ingest_stats);
        drop(connection);
        let _ = ingest_task.await;

        tracing::info!("engine shut down");
        result
    }
}

impl<C: TagServerClient + 'static> std::fmt::Debug for Engine<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("state", &self.connection.state())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Tests
// =============================================================================
