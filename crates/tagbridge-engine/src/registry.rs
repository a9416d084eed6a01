// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Subscription registry.
//!
//! Maps tag identifiers to their server-side subscription constructs and
//! enforces the engine's subscription invariants:
//!
//! - at most one subscription per tag identifier
//! - every registered tag has an entry in the live value store, inserted
//!   as a pending placeholder before the first notification can arrive
//! - listeners are attached strictly after the subscription construct
//!   exists, and detached before it is disposed
//! - a notification racing an unsubscribe is dropped, never applied to a
//!   removed tag
//!
//! One server-side subscription is created per tag. This mirrors the
//! reference behavior the engine is compatible with; batching many tags
//! into one construct would change the subscription cardinality and is
//! deliberately not done here.
//!
//! Subscribe/unsubscribe calls are serialized by the caller; the registry
//! still takes its write lock for them because the ingestion path runs
//! concurrently and filters under the read lock. Holding the read lock
//! across the membership check and the store write means an unsubscribe
//! (write lock) either runs before the check or after the store write -
//! in both orders the store ends up without the removed tag.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use tagbridge_core::client::{ClientSubscriptionId, TagServerClient};
use tagbridge_core::error::{EngineError, EngineResult};
use tagbridge_core::notify::{ChangeBatch, NotificationSender};
use tagbridge_core::types::{SubscriptionConfig, TagId};

use crate::connection::ConnectionManager;
use crate::store::LiveValueStore;

// =============================================================================
// SubscriptionHandle
// =============================================================================

/// Registry-owned record of one tag's subscription.
#[derive(Debug, Clone)]
pub struct SubscriptionHandle {
    /// The subscribed tag.
    pub tag_id: TagId,

    /// Display name shown for the tag.
    pub display_name: String,

    /// Server-assigned subscription construct.
    pub client_subscription: ClientSubscriptionId,

    /// Settings the construct was created with.
    pub config: SubscriptionConfig,

    /// Whether change delivery is active.
    pub active: bool,

    /// When the subscription was registered.
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// SubscriptionRegistry
// =============================================================================

/// Owns the tag -> subscription mapping and the handle lifecycle.
pub struct SubscriptionRegistry<C> {
    connection: Arc<ConnectionManager<C>>,
    store: Arc<LiveValueStore>,
    subs: RwLock<HashMap<TagId, SubscriptionHandle>>,
    config: SubscriptionConfig,
    ingest_tx: NotificationSender,
}

impl<C: TagServerClient> SubscriptionRegistry<C> {
    /// Creates a registry over the given connection and store.
    ///
    /// `ingest_tx` is the sending half of the engine's notification
    /// channel; a clone of it is attached to every subscription created.
    pub fn new(
        connection: Arc<ConnectionManager<C>>,
        store: Arc<LiveValueStore>,
        config: SubscriptionConfig,
        ingest_tx: NotificationSender,
    ) -> Self {
        Self {
            connection,
            store,
            subs: RwLock::new(HashMap::new()),
            config,
            ingest_tx,
        }
    }

    /// Registers a tag for change delivery.
    ///
    /// Creates one subscription construct on the active connection,
    /// registers the tag on it, inserts the pending live value, and only
    /// then attaches the ingestion listener - so no notification can
    /// precede a successful return.
    ///
    /// # Errors
    ///
    /// - [`EngineError::NotConnected`] - no active connection
    /// - [`EngineError::AlreadySubscribed`] - the tag is already registered
    /// - [`EngineError::SubscriptionCreation`] - the server refused the
    ///   construct or the item registration
    pub async fn subscribe(
        &self,
        tag_id: TagId,
        display_name: impl Into<String>,
    ) -> EngineResult<SubscriptionHandle> {
        if !self.connection.is_connected() {
            return Err(EngineError::NotConnected);
        }

        let mut subs = self.subs.write().await;
        if subs.contains_key(&tag_id) {
            return Err(EngineError::already_subscribed(tag_id.as_str()));
        }

        let client = self.connection.client();
        let client = client.lock().await;

        let subscription = client
            .create_subscription(&self.config)
            .await
            .map_err(|e| EngineError::subscription_creation(tag_id.as_str(), e.to_string()))?;

        if let Err(e) = client.add_item(subscription, &tag_id).await {
            // Roll the construct back so nothing dangles server-side.
            let _ = client.delete_subscription(subscription).await;
            return Err(EngineError::subscription_creation(
                tag_id.as_str(),
                e.to_string(),
            ));
        }

        self.store.insert_pending(&tag_id);

        if let Err(e) = client
            .attach_listener(subscription, self.ingest_tx.clone())
            .await
        {
            let _ = client.delete_subscription(subscription).await;
            self.store.remove(&tag_id);
            return Err(EngineError::subscription_creation(
                tag_id.as_str(),
                e.to_string(),
            ));
        }

        let handle = SubscriptionHandle {
            tag_id: tag_id.clone(),
            display_name: display_name.into(),
            client_subscription: subscription,
            config: self.config.clone(),
            active: true,
            created_at: Utc::now(),
        };
        subs.insert(tag_id.clone(), handle.clone());

        tracing::info!(tag_id = %tag_id, subscription = %subscription, "subscribed");
        Ok(handle)
    }

    /// Removes a tag's subscription. A silent no-op for unknown tags.
    ///
    /// The listener is detached before the construct is disposed, and the
    /// live value entry is removed under the same write lock, so after
    /// this returns no notification for the tag reaches the store.
    ///
    /// Returns `true` if a subscription was removed.
    pub async fn unsubscribe(&self, tag_id: &TagId) -> bool {
        let mut subs = self.subs.write().await;
        let Some(handle) = subs.remove(tag_id) else {
            return false;
        };

        let client = self.connection.client();
        let client = client.lock().await;

        client.detach_listener(handle.client_subscription).await;
        if let Err(e) = client.delete_subscription(handle.client_subscription).await {
            tracing::warn!(tag_id = %tag_id, error = %e, "failed to dispose subscription");
        }
        self.store.remove(tag_id);

        tracing::info!(tag_id = %tag_id, "unsubscribed");
        true
    }

    /// Detaches and disposes every subscription and clears the store.
    ///
    /// Used on disconnect, server switch, and shutdown. Completes before
    /// the connection manager releases the session, so no server-side
    /// handle outlives its session.
    pub async fn unsubscribe_all(&self) {
        let mut subs = self.subs.write().await;
        if subs.is_empty() {
            self.store.clear();
            return;
        }

        let count = subs.len();
        let client = self.connection.client();
        let client = client.lock().await;

        for (tag_id, handle) in subs.drain() {
            client.detach_listener(handle.client_subscription).await;
            if let Err(e) = client.delete_subscription(handle.client_subscription).await {
                tracing::warn!(tag_id = %tag_id, error = %e, "failed to dispose subscription");
            }
        }
        self.store.clear();

        tracing::info!(count, "all subscriptions removed");
    }

    /// Applies a change batch to the store, dropping notifications for
    /// tags that are no longer registered.
    ///
    /// Returns `(applied, dropped)` counts.
    pub async fn ingest(&self, batch: ChangeBatch) -> (usize, usize) {
        let subs = self.subs.read().await;

        let mut applied = 0;
        let mut dropped = 0;
        for notification in batch {
            if !subs.contains_key(&notification.item_id) {
                tracing::debug!(
                    tag_id = %notification.item_id,
                    "dropping notification for unregistered tag"
                );
                dropped += 1;
                continue;
            }
            if self.store.update(
                &notification.item_id,
                notification.value.to_string(),
                notification.timestamp,
            ) {
                applied += 1;
            } else {
                dropped += 1;
            }
        }
        (applied, dropped)
    }

    /// Returns the current `(tag, subscription)` pairs without mutating
    /// state.
    pub async fn snapshot(&self) -> Vec<SubscriptionHandle> {
        let subs = self.subs.read().await;
        let mut handles: Vec<SubscriptionHandle> = subs.values().cloned().collect();
        handles.sort_by(|a, b| a.tag_id.as_str().cmp(b.tag_id.as_str()));
        handles
    }

    /// Returns `true` if the tag is registered.
    pub async fn contains(&self, tag_id: &TagId) -> bool {
        self.subs.read().await.contains_key(tag_id)
    }

    /// Returns the number of registered tags.
    pub async fn count(&self) -> usize {
        self.subs.read().await.len()
    }
}

impl<C> std::fmt::Debug for SubscriptionRegistry<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionRegistry")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tagbridge_core::notify::{notification_channel, ChangeNotification, NotificationReceiver};
    use tagbridge_core::types::{ServerDescriptor, Value};
    use tagbridge_sim::{SimNamespace, SimTagServer};

    struct Fixture {
        server: SimTagServer,
        registry: SubscriptionRegistry<SimTagServer>,
        store: Arc<LiveValueStore>,
        rx: NotificationReceiver,
    }

    async fn fixture() -> Fixture {
        let server = SimTagServer::new(SimNamespace::demo());
        let connection = Arc::new(ConnectionManager::new(server.clone()));
        connection
            .connect(&ServerDescriptor::new("Sim.1"), Duration::from_secs(1))
            .await
            .unwrap();

        let store = Arc::new(LiveValueStore::new());
        let (tx, rx) = notification_channel(64);
        let registry = SubscriptionRegistry::new(
            connection,
            Arc::clone(&store),
            SubscriptionConfig::default(),
            tx,
        );

        Fixture {
            server,
            registry,
            store,
            rx,
        }
    }

    #[tokio::test]
    async fn test_subscribe_inserts_pending_value() {
        let f = fixture().await;
        let id = TagId::new("Area1.Temp");

        let handle = f.registry.subscribe(id.clone(), "Temp").await.unwrap();
        assert_eq!(handle.tag_id, id);
        assert!(handle.active);

        assert!(f.store.read(&id).unwrap().is_pending());
        assert_eq!(f.server.subscription_count(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_subscribe_rejected() {
        let f = fixture().await;
        let id = TagId::new("Area1.Temp");

        f.registry.subscribe(id.clone(), "Temp").await.unwrap();
        let err = f.registry.subscribe(id.clone(), "Temp").await.unwrap_err();

        assert!(matches!(err, EngineError::AlreadySubscribed { .. }));
        // Exactly one registry entry and one server-side construct remain.
        assert_eq!(f.registry.count().await, 1);
        assert_eq!(f.server.subscription_count(), 1);
    }

    #[tokio::test]
    async fn test_subscribe_requires_connection() {
        let server = SimTagServer::new(SimNamespace::demo());
        let connection = Arc::new(ConnectionManager::new(server));
        let store = Arc::new(LiveValueStore::new());
        let (tx, _rx) = notification_channel(8);
        let registry =
            SubscriptionRegistry::new(connection, store, SubscriptionConfig::default(), tx);

        let err = registry
            .subscribe(TagId::new("Area1.Temp"), "Temp")
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotConnected));
    }

    #[tokio::test]
    async fn test_subscribe_unknown_tag_rolls_back() {
        let f = fixture().await;
        let err = f
            .registry
            .subscribe(TagId::new("Area1.Bogus"), "Bogus")
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::SubscriptionCreation { .. }));
        // The failed construct was disposed; nothing dangles.
        assert_eq!(f.server.subscription_count(), 0);
        assert_eq!(f.registry.count().await, 0);
        assert!(f.store.is_empty());
    }

    #[tokio::test]
    async fn test_unsubscribe_removes_everywhere() {
        let f = fixture().await;
        let id = TagId::new("Area1.Temp");

        f.registry.subscribe(id.clone(), "Temp").await.unwrap();
        assert!(f.registry.unsubscribe(&id).await);

        assert_eq!(f.registry.count().await, 0);
        assert!(f.store.read(&id).is_none());
        assert_eq!(f.server.subscription_count(), 0);

        // Unknown tag: silent no-op.
        assert!(!f.registry.unsubscribe(&id).await);
    }

    #[tokio::test]
    async fn test_notification_after_unsubscribe_dropped() {
        let f = fixture().await;
        let id = TagId::new("Area1.Temp");

        f.registry.subscribe(id.clone(), "Temp").await.unwrap();
        f.registry.unsubscribe(&id).await;

        // A late in-flight batch for the removed tag is a no-op.
        let (applied, dropped) = f
            .registry
            .ingest(vec![ChangeNotification::new(
                id.clone(),
                Value::Float64(99.9),
            )])
            .await;
        assert_eq!(applied, 0);
        assert_eq!(dropped, 1);
        assert!(f.store.read(&id).is_none());
    }

    #[tokio::test]
    async fn test_ingest_applies_registered_tags() {
        let mut f = fixture().await;
        let id = TagId::new("Area1.Temp");
        f.registry.subscribe(id.clone(), "Temp").await.unwrap();

        // The sim delivers through the attached listener into our channel.
        f.server.push_value("Area1.Temp", Value::Float64(73.5)).await;
        let batch = f.rx.recv().await.unwrap();

        let (applied, dropped) = f.registry.ingest(batch).await;
        assert_eq!((applied, dropped), (1, 0));
        assert_eq!(f.store.read(&id).unwrap().value, "73.5");
    }

    #[tokio::test]
    async fn test_unsubscribe_all() {
        let f = fixture().await;
        f.registry
            .subscribe(TagId::new("Area1.Temp"), "Temp")
            .await
            .unwrap();
        f.registry
            .subscribe(TagId::new("Area1.Pressure"), "Pressure")
            .await
            .unwrap();
        assert_eq!(f.server.subscription_count(), 2);

        f.registry.unsubscribe_all().await;

        assert_eq!(f.registry.count().await, 0);
        assert!(f.store.is_empty());
        assert_eq!(f.server.subscription_count(), 0);
    }

    #[tokio::test]
    async fn test_snapshot_sorted_and_non_mutating() {
        let f = fixture().await;
        f.registry
            .subscribe(TagId::new("Area2.Flow"), "Flow")
            .await
            .unwrap();
        f.registry
            .subscribe(TagId::new("Area1.Temp"), "Temp")
            .await
            .unwrap();

        let snapshot = f.registry.snapshot().await;
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].tag_id.as_str(), "Area1.Temp");
        assert_eq!(snapshot[1].tag_id.as_str(), "Area2.Flow");
        assert_eq!(f.registry.count().await, 2);
    }
}
