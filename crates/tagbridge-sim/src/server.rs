// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Simulated tag server.
//!
//! [`SimTagServer`] implements [`TagServerClient`] against an in-memory
//! namespace. Tests and the CLI demo use [`SimTagServer::push_value`] to
//! stand in for server-side process changes; each push fans out a change
//! batch to the listeners of every subscription that carries the item.
//!
//! The server is cheaply cloneable (shared inner state), so a test can
//! keep a handle while the engine owns the client.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use tagbridge_core::client::{
    BrowseElement, BrowseFilter, ClientSubscriptionId, ItemReading, TagServerClient,
};
use tagbridge_core::error::{ClientError, ClientResult};
use tagbridge_core::notify::{ChangeNotification, NotificationSender};
use tagbridge_core::types::{
    ServerDescriptor, SubscriptionConfig, TagId, Value, HIERARCHY_SEPARATOR,
};

use crate::namespace::SimNamespace;

// =============================================================================
// SimTagServer
// =============================================================================

/// An in-process tag server implementing the external client contract.
#[derive(Clone)]
pub struct SimTagServer {
    inner: Arc<SimInner>,
}

struct SimInner {
    namespace: SimNamespace,
    known_servers: Vec<String>,
    state: Mutex<SimState>,
}

#[derive(Default)]
struct SimState {
    connected: bool,
    fail_connect: bool,
    failing_reads: HashSet<TagId>,
    next_subscription_id: u32,
    subscriptions: HashMap<ClientSubscriptionId, SimSubscription>,
    values: HashMap<TagId, (Value, DateTime<Utc>)>,
}

struct SimSubscription {
    #[allow(dead_code)]
    config: SubscriptionConfig,
    items: Vec<TagId>,
    listener: Option<NotificationSender>,
}

impl SimTagServer {
    /// Creates a server exposing the given namespace, reachable as
    /// `"Sim.1"`.
    pub fn new(namespace: SimNamespace) -> Self {
        Self::with_servers(namespace, ["Sim.1"])
    }

    /// Creates a server reachable under the given names.
    pub fn with_servers(
        namespace: SimNamespace,
        servers: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        let mut state = SimState {
            next_subscription_id: 1,
            ..Default::default()
        };
        for (id, value) in namespace.all_tags() {
            state.values.insert(id, (value, Utc::now()));
        }

        Self {
            inner: Arc::new(SimInner {
                namespace,
                known_servers: servers.into_iter().map(Into::into).collect(),
                state: Mutex::new(state),
            }),
        }
    }

    /// Makes the next connect attempts fail with a transport error.
    pub fn fail_connect(&self, fail: bool) {
        self.lock().fail_connect = fail;
    }

    /// Makes read-backs fail for the given item.
    pub fn fail_read(&self, item: impl Into<TagId>) {
        self.lock().failing_reads.insert(item.into());
    }

    /// Updates an item's value and notifies subscribed listeners, stamped
    /// with the current time.
    pub async fn push_value(&self, item: impl Into<TagId>, value: Value) {
        self.push_value_at(item, value, Utc::now()).await;
    }

    /// Updates an item's value with an explicit timestamp and notifies
    /// subscribed listeners.
    pub async fn push_value_at(
        &self,
        item: impl Into<TagId>,
        value: Value,
        timestamp: DateTime<Utc>,
    ) {
        let item = item.into();

        // Collect listeners under the lock, send after releasing it.
        let listeners: Vec<NotificationSender> = {
            let mut state = self.lock();
            state
                .values
                .insert(item.clone(), (value.clone(), timestamp));
            state
                .subscriptions
                .values()
                .filter(|sub| sub.items.contains(&item))
                .filter_map(|sub| sub.listener.clone())
                .collect()
        };

        for listener in listeners {
            let batch = vec![ChangeNotification::with_timestamp(
                item.clone(),
                value.clone(),
                timestamp,
            )];
            if listener.send(batch).await.is_err() {
                tracing::debug!(item = %item, "listener channel closed, dropping notification");
            }
        }
    }

    /// Returns the number of live server-side subscription constructs.
    pub fn subscription_count(&self) -> usize {
        self.lock().subscriptions.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SimState> {
        self.inner.state.lock().expect("sim state poisoned")
    }

    fn qualify(parent: &str, name: &str) -> String {
        format!("{}{}{}", parent, HIERARCHY_SEPARATOR, name)
    }
}

// =============================================================================
// TagServerClient Implementation
// =============================================================================

#[async_trait]
impl TagServerClient for SimTagServer {
    async fn connect(&mut self, server: &ServerDescriptor) -> ClientResult<()> {
        let mut state = self.lock();

        if state.fail_connect {
            return Err(ClientError::transport(format!(
                "no route to server '{}'",
                server
            )));
        }
        if !self.inner.known_servers.iter().any(|s| s == &server.name) {
            return Err(ClientError::transport(format!(
                "unknown server '{}'",
                server
            )));
        }

        // A fresh session: any constructs from a previous (possibly
        // faulted) session are gone.
        state.subscriptions.clear();
        state.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) -> ClientResult<()> {
        let mut state = self.lock();
        state.connected = false;
        state.subscriptions.clear();
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.lock().connected
    }

    async fn browse(
        &self,
        parent: Option<&str>,
        filter: BrowseFilter,
    ) -> ClientResult<Vec<BrowseElement>> {
        if !self.is_connected() {
            return Err(ClientError::NotConnected);
        }

        let ns = &self.inner.namespace;
        match parent {
            None => Ok(match filter {
                BrowseFilter::Branch => ns
                    .branches
                    .iter()
                    .map(|b| BrowseElement::new(&b.name, b.name.as_str(), b.has_children()))
                    .collect(),
                BrowseFilter::Item => ns
                    .root_tags
                    .iter()
                    .map(|t| BrowseElement::new(&t.name, t.name.as_str(), false))
                    .collect(),
            }),
            Some(path) => {
                let branch = ns
                    .find_branch(path)
                    .ok_or_else(|| ClientError::browse_rejected(path, "unknown branch"))?;
                Ok(match filter {
                    BrowseFilter::Branch => branch
                        .children
                        .iter()
                        .map(|b| {
                            BrowseElement::new(
                                &b.name,
                                Self::qualify(path, &b.name),
                                b.has_children(),
                            )
                        })
                        .collect(),
                    BrowseFilter::Item => branch
                        .tags
                        .iter()
                        .map(|t| BrowseElement::new(&t.name, Self::qualify(path, &t.name), false))
                        .collect(),
                })
            }
        }
    }

    async fn create_subscription(
        &self,
        config: &SubscriptionConfig,
    ) -> ClientResult<ClientSubscriptionId> {
        let mut state = self.lock();
        if !state.connected {
            return Err(ClientError::NotConnected);
        }

        let id = ClientSubscriptionId::new(state.next_subscription_id);
        state.next_subscription_id += 1;
        state.subscriptions.insert(
            id,
            SimSubscription {
                config: config.clone(),
                items: Vec::new(),
                listener: None,
            },
        );
        Ok(id)
    }

    async fn add_item(&self, subscription: ClientSubscriptionId, item: &TagId) -> ClientResult<()> {
        let mut state = self.lock();
        if !state.connected {
            return Err(ClientError::NotConnected);
        }
        if !self.inner.namespace.contains_tag(item) {
            return Err(ClientError::item_not_found(item.as_str()));
        }

        let sub = state
            .subscriptions
            .get_mut(&subscription)
            .ok_or_else(|| ClientError::subscription_rejected(format!("unknown {}", subscription)))?;
        sub.items.push(item.clone());
        Ok(())
    }

    async fn attach_listener(
        &self,
        subscription: ClientSubscriptionId,
        sink: NotificationSender,
    ) -> ClientResult<()> {
        let mut state = self.lock();
        let sub = state
            .subscriptions
            .get_mut(&subscription)
            .ok_or_else(|| ClientError::subscription_rejected(format!("unknown {}", subscription)))?;
        sub.listener = Some(sink);
        Ok(())
    }

    async fn detach_listener(&self, subscription: ClientSubscriptionId) {
        if let Some(sub) = self.lock().subscriptions.get_mut(&subscription) {
            sub.listener = None;
        }
    }

    async fn delete_subscription(&self, subscription: ClientSubscriptionId) -> ClientResult<()> {
        self.lock().subscriptions.remove(&subscription);
        Ok(())
    }

    async fn read_subscription(
        &self,
        subscription: ClientSubscriptionId,
    ) -> ClientResult<Vec<ItemReading>> {
        let state = self.lock();
        if !state.connected {
            return Err(ClientError::NotConnected);
        }

        let sub = state
            .subscriptions
            .get(&subscription)
            .ok_or_else(|| ClientError::subscription_rejected(format!("unknown {}", subscription)))?;

        let mut readings = Vec::with_capacity(sub.items.len());
        for item in &sub.items {
            if state.failing_reads.contains(item) {
                return Err(ClientError::read_failed(item.as_str(), "simulated read failure"));
            }
            match state.values.get(item) {
                Some((value, timestamp)) => {
                    readings.push(ItemReading::new(item.clone(), value.clone(), *timestamp));
                }
                None => readings.push(ItemReading::empty(item.clone(), Utc::now())),
            }
        }
        Ok(readings)
    }
}

impl std::fmt::Debug for SimTagServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("SimTagServer")
            .field("connected", &state.connected)
            .field("subscriptions", &state.subscriptions.len())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tagbridge_core::notify::notification_channel;

    fn connected_server() -> SimTagServer {
        SimTagServer::new(SimNamespace::demo())
    }

    async fn connect(server: &SimTagServer) {
        let mut client = server.clone();
        client
            .connect(&ServerDescriptor::new("Sim.1"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_connect_known_and_unknown() {
        let mut server = connected_server();
        assert!(server
            .connect(&ServerDescriptor::new("Sim.1"))
            .await
            .is_ok());
        assert!(server.is_connected());

        let mut other = SimTagServer::new(SimNamespace::demo());
        let err = other
            .connect(&ServerDescriptor::new("Nope.1"))
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), "transport");
    }

    #[tokio::test]
    async fn test_browse_top_level() {
        let server = connected_server();
        connect(&server).await;

        let branches = server.browse(None, BrowseFilter::Branch).await.unwrap();
        let names: Vec<&str> = branches.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["Area1", "Area2"]);
        assert!(branches.iter().all(|b| b.has_children));

        let root_items = server.browse(None, BrowseFilter::Item).await.unwrap();
        assert_eq!(root_items.len(), 1);
        assert_eq!(root_items[0].item_id.as_str(), "Status");
    }

    #[tokio::test]
    async fn test_browse_branch_items() {
        let server = connected_server();
        connect(&server).await;

        let items = server
            .browse(Some("Area1"), BrowseFilter::Item)
            .await
            .unwrap();
        let ids: Vec<&str> = items.iter().map(|i| i.item_id.as_str()).collect();
        assert_eq!(ids, vec!["Area1.Temp", "Area1.Pressure"]);

        let err = server
            .browse(Some("Area9"), BrowseFilter::Item)
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), "browse_rejected");
    }

    #[tokio::test]
    async fn test_browse_requires_connection() {
        let server = connected_server();
        let err = server.browse(None, BrowseFilter::Branch).await.unwrap_err();
        assert!(matches!(err, ClientError::NotConnected));
    }

    #[tokio::test]
    async fn test_subscription_delivery() {
        let server = connected_server();
        connect(&server).await;

        let sub = server
            .create_subscription(&SubscriptionConfig::default())
            .await
            .unwrap();
        server
            .add_item(sub, &TagId::new("Area1.Temp"))
            .await
            .unwrap();

        let (tx, mut rx) = notification_channel(8);
        server.attach_listener(sub, tx).await.unwrap();

        server.push_value("Area1.Temp", Value::Float64(73.0)).await;

        let batch = rx.recv().await.unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].item_id.as_str(), "Area1.Temp");
        assert_eq!(batch[0].value, Value::Float64(73.0));
    }

    #[tokio::test]
    async fn test_no_delivery_after_detach() {
        let server = connected_server();
        connect(&server).await;

        let sub = server
            .create_subscription(&SubscriptionConfig::default())
            .await
            .unwrap();
        server
            .add_item(sub, &TagId::new("Area1.Temp"))
            .await
            .unwrap();

        let (tx, mut rx) = notification_channel(8);
        server.attach_listener(sub, tx).await.unwrap();
        server.detach_listener(sub).await;

        server.push_value("Area1.Temp", Value::Float64(73.0)).await;

        // Sender dropped on detach; channel reports closed, not a value.
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_add_unknown_item() {
        let server = connected_server();
        connect(&server).await;

        let sub = server
            .create_subscription(&SubscriptionConfig::default())
            .await
            .unwrap();
        let err = server
            .add_item(sub, &TagId::new("Area1.Bogus"))
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), "item_not_found");
    }

    #[tokio::test]
    async fn test_read_subscription() {
        let server = connected_server();
        connect(&server).await;

        let sub = server
            .create_subscription(&SubscriptionConfig::default())
            .await
            .unwrap();
        server
            .add_item(sub, &TagId::new("Area1.Temp"))
            .await
            .unwrap();

        let readings = server.read_subscription(sub).await.unwrap();
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].value, Some(Value::Float64(72.3)));

        server.fail_read(TagId::new("Area1.Temp"));
        let err = server.read_subscription(sub).await.unwrap_err();
        assert_eq!(err.error_type(), "read_failed");
    }

    #[tokio::test]
    async fn test_fresh_session_drops_subscriptions() {
        let server = connected_server();
        connect(&server).await;

        let sub = server
            .create_subscription(&SubscriptionConfig::default())
            .await
            .unwrap();
        server
            .add_item(sub, &TagId::new("Area1.Temp"))
            .await
            .unwrap();
        assert_eq!(server.subscription_count(), 1);

        // Reconnect: the old session's constructs are gone.
        connect(&server).await;
        assert_eq!(server.subscription_count(), 0);
    }
}
