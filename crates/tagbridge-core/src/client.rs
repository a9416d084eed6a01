// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! External tag-server client abstraction.
//!
//! The engine does not implement its own network transport; it drives an
//! external client through the [`TagServerClient`] trait. Implementations
//! handle addressing, session negotiation, and the server-side plumbing of
//! subscriptions and change delivery.
//!
//! # Lifecycle
//!
//! 1. `connect()` establishes a session (a faulted session is never
//!    reused - each call creates a fresh one)
//! 2. `browse()` walks the namespace
//! 3. `create_subscription()` / `add_item()` register tags for delivery
//! 4. `attach_listener()` wires change batches into the caller's channel,
//!    strictly after the subscription construct exists
//! 5. `detach_listener()` then `delete_subscription()` tear down
//! 6. `disconnect()` releases the session
//!
//! # Thread Safety
//!
//! Implementations must be `Send + Sync`. The `&self` methods may be
//! called concurrently; `connect`/`disconnect` take `&mut self` and are
//! serialized by the caller.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ClientResult;
use crate::notify::NotificationSender;
use crate::types::{ServerDescriptor, SubscriptionConfig, TagId, Value};

// =============================================================================
// Browse Types
// =============================================================================

/// What kind of namespace entries a browse call should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrowseFilter {
    /// Container nodes.
    Branch,

    /// Leaf entries.
    Item,
}

/// One entry returned by a browse call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowseElement {
    /// Display name of the entry.
    pub name: String,

    /// Fully-qualified item identifier.
    pub item_id: TagId,

    /// Whether the entry has further children.
    pub has_children: bool,
}

impl BrowseElement {
    /// Creates a browse element.
    pub fn new(name: impl Into<String>, item_id: impl Into<TagId>, has_children: bool) -> Self {
        Self {
            name: name.into(),
            item_id: item_id.into(),
            has_children,
        }
    }
}

// =============================================================================
// Subscription Handle
// =============================================================================

/// Server-assigned identifier of a subscription construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientSubscriptionId(pub u32);

impl ClientSubscriptionId {
    /// Creates a subscription id.
    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw id value.
    #[inline]
    pub const fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ClientSubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "csub-{}", self.0)
    }
}

// =============================================================================
// Item Reading
// =============================================================================

/// A value read back synchronously from a subscription's items.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemReading {
    /// The item that was read.
    pub item_id: TagId,

    /// The value, or `None` when the server reported no value.
    pub value: Option<Value>,

    /// Timestamp reported with the reading.
    pub timestamp: DateTime<Utc>,
}

impl ItemReading {
    /// Creates a reading with a value.
    pub fn new(item_id: impl Into<TagId>, value: Value, timestamp: DateTime<Utc>) -> Self {
        Self {
            item_id: item_id.into(),
            value: Some(value),
            timestamp,
        }
    }

    /// Creates a reading without a value.
    pub fn empty(item_id: impl Into<TagId>, timestamp: DateTime<Utc>) -> Self {
        Self {
            item_id: item_id.into(),
            value: None,
            timestamp,
        }
    }
}

// =============================================================================
// TagServerClient Trait
// =============================================================================

/// The contract the engine consumes from an external tag-server client.
#[async_trait]
pub trait TagServerClient: Send + Sync {
    /// Establishes a session to the named server.
    ///
    /// Each call creates a fresh underlying session; a previously faulted
    /// session is never reused.
    async fn connect(&mut self, server: &ServerDescriptor) -> ClientResult<()>;

    /// Releases the session. Idempotent; a no-op when not connected.
    async fn disconnect(&mut self) -> ClientResult<()>;

    /// Returns `true` if a session is established.
    fn is_connected(&self) -> bool;

    /// Browses entries under `parent` (or the namespace root when `None`)
    /// matching the given filter. Server ordering is preserved.
    async fn browse(
        &self,
        parent: Option<&str>,
        filter: BrowseFilter,
    ) -> ClientResult<Vec<BrowseElement>>;

    /// Creates a subscription construct on the server.
    async fn create_subscription(
        &self,
        config: &SubscriptionConfig,
    ) -> ClientResult<ClientSubscriptionId>;

    /// Registers an item on an existing subscription.
    async fn add_item(&self, subscription: ClientSubscriptionId, item: &TagId) -> ClientResult<()>;

    /// Attaches a change-batch listener to a subscription.
    ///
    /// No batch is delivered to the sender before this call; after
    /// [`detach_listener`](Self::detach_listener) returns, no further
    /// batch is sent.
    async fn attach_listener(
        &self,
        subscription: ClientSubscriptionId,
        sink: NotificationSender,
    ) -> ClientResult<()>;

    /// Detaches the listener of a subscription. A no-op when none is
    /// attached.
    async fn detach_listener(&self, subscription: ClientSubscriptionId);

    /// Deletes a subscription construct. Implementations detach any
    /// remaining listener first. A no-op for unknown ids.
    async fn delete_subscription(&self, subscription: ClientSubscriptionId) -> ClientResult<()>;

    /// Synchronously reads back the current values of all items attached
    /// to a subscription.
    async fn read_subscription(
        &self,
        subscription: ClientSubscriptionId,
    ) -> ClientResult<Vec<ItemReading>>;
}

// =============================================================================
// ServerEnumerator Trait
// =============================================================================

/// Enumerates the tag servers reachable from this host.
#[async_trait]
pub trait ServerEnumerator: Send + Sync {
    /// Lists available servers in provider order.
    async fn list_servers(&self) -> ClientResult<Vec<ServerDescriptor>>;
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browse_element() {
        let el = BrowseElement::new("Temp", "Area1.Temp", false);
        assert_eq!(el.name, "Temp");
        assert_eq!(el.item_id.as_str(), "Area1.Temp");
        assert!(!el.has_children);
    }

    #[test]
    fn test_client_subscription_id_display() {
        let id = ClientSubscriptionId::new(7);
        assert_eq!(id.value(), 7);
        assert_eq!(id.to_string(), "csub-7");
    }

    #[test]
    fn test_item_reading() {
        let now = Utc::now();
        let reading = ItemReading::new("Area1.Temp", Value::Float64(72.3), now);
        assert_eq!(reading.value, Some(Value::Float64(72.3)));

        let empty = ItemReading::empty("Area1.Temp", now);
        assert!(empty.value.is_none());
    }
}
