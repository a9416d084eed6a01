// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Core data types for TagBridge.
//!
//! This module provides the data model shared by every TagBridge component:
//! tag identifiers, namespace entries, live values, and export records.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Separator between hierarchy levels in a fully-qualified tag identifier.
pub const HIERARCHY_SEPARATOR: char = '.';

/// Branch name reported for tags that live directly under the namespace root.
pub const ROOT_BRANCH: &str = "Root";

/// Placeholder value stored for a tag between subscribe and the first
/// change notification.
pub const PENDING_VALUE: &str = "waiting for value";

// =============================================================================
// Identifiers
// =============================================================================

/// A fully-qualified tag identifier as reported by the server.
///
/// Tag identifiers are dotted paths (`"Area1.Temp"`); a tag with no
/// separator sits directly under the namespace root.
///
/// # Examples
///
/// ```
/// use tagbridge_core::types::TagId;
///
/// let id = TagId::new("Area1.Temp");
/// assert_eq!(id.parent_path(), Some("Area1"));
/// assert_eq!(id.leaf_name(), "Temp");
///
/// let root = TagId::new("Status");
/// assert_eq!(root.parent_path(), None);
/// assert_eq!(root.leaf_name(), "Status");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagId(String);

impl TagId {
    /// Creates a new tag identifier.
    #[inline]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the identifier and returns the inner string.
    #[inline]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Returns everything before the last hierarchy separator, or `None`
    /// for a tag directly under the root.
    pub fn parent_path(&self) -> Option<&str> {
        self.0
            .rfind(HIERARCHY_SEPARATOR)
            .map(|idx| &self.0[..idx])
    }

    /// Returns the final path segment of the identifier.
    pub fn leaf_name(&self) -> &str {
        match self.0.rfind(HIERARCHY_SEPARATOR) {
            Some(idx) => &self.0[idx + 1..],
            None => &self.0,
        }
    }

    /// Returns the branch name used for export rows: the parent path, or
    /// [`ROOT_BRANCH`] when the tag has none.
    pub fn branch_name(&self) -> &str {
        self.parent_path().unwrap_or(ROOT_BRANCH)
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TagId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TagId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for TagId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// Server Descriptor
// =============================================================================

/// Identifies a discoverable tag server.
///
/// Descriptors are produced by server enumeration and are immutable; the
/// address scheme used to actually reach the server is a client concern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServerDescriptor {
    /// Server name as reported by the enumeration provider.
    pub name: String,
}

impl ServerDescriptor {
    /// Creates a new server descriptor.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Returns the server name as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ServerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl From<&str> for ServerDescriptor {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

// =============================================================================
// Connection State
// =============================================================================

/// The connection state of the engine's single server session.
///
/// Legal transitions:
///
/// ```text
/// Disconnected -> Connecting -> Connected
/// Connected    -> Disconnected          (explicit disconnect)
/// Connecting   -> Faulted               (transport error)
/// Connected    -> Faulted               (transport error)
/// Faulted      -> Connecting            (retry with a fresh session)
/// ```
///
/// No transition skips `Connecting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No active session.
    #[default]
    Disconnected,

    /// Session establishment in progress.
    Connecting,

    /// Session established and operational.
    Connected,

    /// Session lost to a transport error; retry permitted.
    Faulted,
}

impl ConnectionState {
    /// Returns `true` if the session is established.
    #[inline]
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Returns `true` if a transition to `next` is legal.
    pub fn can_transition_to(&self, next: ConnectionState) -> bool {
        use ConnectionState::*;
        matches!(
            (self, next),
            (Disconnected, Connecting)
                | (Connecting, Connected)
                | (Connecting, Faulted)
                | (Connected, Disconnected)
                | (Connected, Faulted)
                | (Faulted, Connecting)
        )
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Connected => write!(f, "Connected"),
            Self::Faulted => write!(f, "Faulted"),
        }
    }
}

// =============================================================================
// Value
// =============================================================================

/// A tag value as reported by the server.
///
/// The engine stores values for display and export and performs no quality
/// interpretation, so the variant set is deliberately small.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    /// Boolean value.
    Bool(bool),

    /// 32-bit signed integer.
    Int32(i32),

    /// 64-bit signed integer.
    Int64(i64),

    /// 64-bit floating point.
    Float64(f64),

    /// UTF-8 string.
    String(String),

    /// Null/undefined value.
    Null,
}

impl Value {
    /// Returns the type name of this value.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int32(_) => "int32",
            Value::Int64(_) => "int64",
            Value::Float64(_) => "float64",
            Value::String(_) => "string",
            Value::Null => "null",
        }
    }

    /// Returns `true` if this is a null value.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Attempts to convert this value to an f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
            Value::Int32(v) => Some(*v as f64),
            Value::Int64(v) => Some(*v as f64),
            Value::Float64(v) => Some(*v),
            _ => None,
        }
    }

    /// Attempts to get this value as a string reference.
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    /// Converts this value to a JSON value.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Bool(v) => serde_json::Value::Bool(*v),
            Value::Int32(v) => serde_json::json!(*v),
            Value::Int64(v) => serde_json::json!(*v),
            Value::Float64(v) => serde_json::json!(*v),
            Value::String(v) => serde_json::Value::String(v.clone()),
            Value::Null => serde_json::Value::Null,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int32(v) => write!(f, "{}", v),
            Value::Int64(v) => write!(f, "{}", v),
            Value::Float64(v) => write!(f, "{}", v),
            Value::String(v) => write!(f, "{}", v),
            Value::Null => write!(f, "null"),
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

// =============================================================================
// Namespace Entries
// =============================================================================

/// A namespace container produced by a branch browse.
///
/// Branch nodes are ephemeral: they describe the server's namespace at the
/// moment of the browse call and are not cached by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchNode {
    /// Branch display name.
    pub name: String,

    /// Whether the branch has further children (branches or tags).
    pub has_children: bool,
}

impl BranchNode {
    /// Creates a new branch node.
    pub fn new(name: impl Into<String>, has_children: bool) -> Self {
        Self {
            name: name.into(),
            has_children,
        }
    }
}

/// A leaf namespace entry produced by a tag browse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagDescriptor {
    /// Display name of the tag.
    pub name: String,

    /// Fully-qualified item identifier.
    pub item_id: TagId,
}

impl TagDescriptor {
    /// Creates a new tag descriptor.
    pub fn new(name: impl Into<String>, item_id: impl Into<TagId>) -> Self {
        Self {
            name: name.into(),
            item_id: item_id.into(),
        }
    }
}

// =============================================================================
// Live Value
// =============================================================================

/// The latest known value of a subscribed tag.
///
/// Value and timestamp always change together; the store replaces the
/// whole record on update, never one half of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveValue {
    /// Display string of the last reported value.
    pub value: String,

    /// When the value was reported.
    pub timestamp: DateTime<Utc>,
}

impl LiveValue {
    /// Creates a live value.
    pub fn new(value: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            value: value.into(),
            timestamp,
        }
    }

    /// Creates the pending placeholder inserted at subscribe time.
    pub fn pending() -> Self {
        Self {
            value: PENDING_VALUE.to_string(),
            timestamp: Utc::now(),
        }
    }

    /// Returns `true` if no change notification has arrived yet.
    pub fn is_pending(&self) -> bool {
        self.value == PENDING_VALUE
    }
}

// =============================================================================
// Subscription Config
// =============================================================================

/// Settings applied to each server-side subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionConfig {
    /// Server update interval for change notifications.
    pub update_rate: Duration,
}

impl SubscriptionConfig {
    /// Creates a subscription config with the given update rate.
    pub fn new(update_rate: Duration) -> Self {
        Self { update_rate }
    }

    /// Sets the update rate.
    pub fn with_update_rate(mut self, update_rate: Duration) -> Self {
        self.update_rate = update_rate;
        self
    }
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        // Reference update rate for change delivery.
        Self {
            update_rate: Duration::from_millis(1000),
        }
    }
}

// =============================================================================
// Export Record
// =============================================================================

/// One denormalized row of a point-in-time export snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRecord {
    /// Name of the server the values were read from.
    pub server_name: String,

    /// Branch portion of the tag identifier, or [`ROOT_BRANCH`].
    pub branch_name: String,

    /// Final path segment of the tag identifier.
    pub tag_name: String,

    /// Fully-qualified tag identifier.
    pub tag_id: TagId,

    /// Display string of the value at read time.
    pub value: String,

    /// Timestamp reported with the value.
    pub timestamp: DateTime<Utc>,
}

impl ExportRecord {
    /// Builds a record for one tag read, deriving the branch and tag names
    /// from the fully-qualified identifier.
    pub fn new(
        server_name: impl Into<String>,
        tag_id: TagId,
        value: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let branch_name = tag_id.branch_name().to_string();
        let tag_name = tag_id.leaf_name().to_string();

        Self {
            server_name: server_name.into(),
            branch_name,
            tag_name,
            tag_id,
            value: value.into(),
            timestamp,
        }
    }
}

impl fmt::Display for ExportRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{} = {} @ {}",
            self.server_name,
            self.branch_name,
            self.tag_name,
            self.value,
            self.timestamp.format("%Y-%m-%d %H:%M:%S%.3f")
        )
    }
}

// =============================================================================
// Tests
// =============================================================================
