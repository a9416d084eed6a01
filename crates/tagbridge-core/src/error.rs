// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Unified error hierarchy for TagBridge.
//!
//! Two layers of errors exist:
//!
//! - [`ClientError`] - failures reported by the external tag-server client
//! - [`EngineError`] - failures surfaced by the engine to its callers,
//!   always carrying the operation and the server/tag identifier involved
//!
//! Connection, browse, and subscribe failures propagate to the caller as
//! typed errors. Per-tag read failures during export and malformed change
//! notifications are handled locally (logged and skipped) and never abort
//! the surrounding operation.
//!
//! # Examples
//!
//! ```
//! use tagbridge_core::error::EngineError;
//! use std::time::Duration;
//!
//! let error = EngineError::timeout(Duration::from_secs(5));
//! assert!(error.is_retryable());
//! assert_eq!(error.error_type(), "timeout");
//! ```

use std::time::Duration;

use thiserror::Error;

// =============================================================================
// ClientError
// =============================================================================

/// Errors reported by an external tag-server client implementation.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport-level failure (connect, negotiation, session loss).
    #[error("Transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
        /// Underlying error.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation attempted without an established session.
    #[error("Client is not connected")]
    NotConnected,

    /// Server rejected or timed out a browse request.
    #[error("Browse rejected for '{node}': {message}")]
    BrowseRejected {
        /// The browsed node, or `<root>`.
        node: String,
        /// Error message.
        message: String,
    },

    /// Server refused to create a subscription construct.
    #[error("Subscription rejected: {message}")]
    SubscriptionRejected {
        /// Error message.
        message: String,
    },

    /// Item identifier unknown to the server.
    #[error("Item not found: {item}")]
    ItemNotFound {
        /// The missing item identifier.
        item: String,
    },

    /// Read-back of a subscription's items failed.
    #[error("Read failed for '{item}': {message}")]
    ReadFailed {
        /// The item identifier.
        item: String,
        /// Error message.
        message: String,
    },

    /// Server enumeration failed.
    #[error("Server enumeration failed: {message}")]
    Enumeration {
        /// Error message.
        message: String,
    },
}

impl ClientError {
    /// Creates a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a transport error with a source.
    pub fn transport_with<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Transport {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a browse-rejected error.
    pub fn browse_rejected(node: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BrowseRejected {
            node: node.into(),
            message: message.into(),
        }
    }

    /// Creates a subscription-rejected error.
    pub fn subscription_rejected(message: impl Into<String>) -> Self {
        Self::SubscriptionRejected {
            message: message.into(),
        }
    }

    /// Creates an item-not-found error.
    pub fn item_not_found(item: impl Into<String>) -> Self {
        Self::ItemNotFound { item: item.into() }
    }

    /// Creates a read-failed error.
    pub fn read_failed(item: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ReadFailed {
            item: item.into(),
            message: message.into(),
        }
    }

    /// Creates an enumeration error.
    pub fn enumeration(message: impl Into<String>) -> Self {
        Self::Enumeration {
            message: message.into(),
        }
    }

    /// Returns `true` if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ClientError::Transport { .. } | ClientError::NotConnected
        )
    }

    /// Returns the error type for logging/metrics.
    pub fn error_type(&self) -> &'static str {
        match self {
            ClientError::Transport { .. } => "transport",
            ClientError::NotConnected => "not_connected",
            ClientError::BrowseRejected { .. } => "browse_rejected",
            ClientError::SubscriptionRejected { .. } => "subscription_rejected",
            ClientError::ItemNotFound { .. } => "item_not_found",
            ClientError::ReadFailed { .. } => "read_failed",
            ClientError::Enumeration { .. } => "enumeration",
        }
    }
}

// =============================================================================
// EngineError
// =============================================================================

/// Errors surfaced by the engine to its callers.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Connecting to the named server failed.
    #[error("Failed to connect to '{server}': {message}")]
    ConnectionFailed {
        /// Server name.
        server: String,
        /// Error message.
        message: String,
        /// Underlying client error.
        #[source]
        source: Option<ClientError>,
    },

    /// The connect attempt exceeded its deadline.
    #[error("Connect timed out after {duration:?}")]
    Timeout {
        /// The timeout that elapsed.
        duration: Duration,
    },

    /// Operation attempted with no active connection.
    #[error("No active server connection")]
    NotConnected,

    /// The tag is already registered for change delivery.
    #[error("Already subscribed to '{tag_id}'")]
    AlreadySubscribed {
        /// The duplicated tag identifier.
        tag_id: String,
    },

    /// A browse request was rejected or failed.
    #[error("Browse failed for '{scope}': {message}")]
    Browse {
        /// The browsed scope (branch name or `<root>`).
        scope: String,
        /// Error message.
        message: String,
    },

    /// The server refused to create the subscription construct.
    #[error("Failed to create subscription for '{tag_id}': {message}")]
    SubscriptionCreation {
        /// The tag identifier.
        tag_id: String,
        /// Error message.
        message: String,
    },

    /// Reading back a single tag failed at export time.
    ///
    /// This variant is logged and skipped by the snapshot builder; it only
    /// reaches callers that read individual subscriptions directly.
    #[error("Read failed for tag '{tag_id}': {message}")]
    TagRead {
        /// The tag identifier.
        tag_id: String,
        /// Error message.
        message: String,
    },
}

impl EngineError {
    /// Creates a connection-failed error.
    pub fn connection_failed(server: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConnectionFailed {
            server: server.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Creates a connection-failed error wrapping a client error.
    pub fn connection_failed_with(server: impl Into<String>, source: ClientError) -> Self {
        Self::ConnectionFailed {
            server: server.into(),
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Creates a timeout error.
    pub fn timeout(duration: Duration) -> Self {
        Self::Timeout { duration }
    }

    /// Creates an already-subscribed error.
    pub fn already_subscribed(tag_id: impl Into<String>) -> Self {
        Self::AlreadySubscribed {
            tag_id: tag_id.into(),
        }
    }

    /// Creates a browse error.
    pub fn browse(scope: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Browse {
            scope: scope.into(),
            message: message.into(),
        }
    }

    /// Creates a subscription-creation error.
    pub fn subscription_creation(tag_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SubscriptionCreation {
            tag_id: tag_id.into(),
            message: message.into(),
        }
    }

    /// Creates a tag-read error.
    pub fn tag_read(tag_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TagRead {
            tag_id: tag_id.into(),
            message: message.into(),
        }
    }

    /// Returns `true` if this error is retryable.
    ///
    /// Retryable errors are transient connection issues that may succeed
    /// on a subsequent attempt; duplicate subscribes and browse rejections
    /// are not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EngineError::ConnectionFailed { .. }
                | EngineError::Timeout { .. }
                | EngineError::NotConnected
        )
    }

    /// Returns the error type for logging/metrics.
    pub fn error_type(&self) -> &'static str {
        match self {
            EngineError::ConnectionFailed { .. } => "connection_failed",
            EngineError::Timeout { .. } => "timeout",
            EngineError::NotConnected => "not_connected",
            EngineError::AlreadySubscribed { .. } => "already_subscribed",
            EngineError::Browse { .. } => "browse",
            EngineError::SubscriptionCreation { .. } => "subscription_creation",
            EngineError::TagRead { .. } => "tag_read",
        }
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// A Result type with ClientError.
pub type ClientResult<T> = Result<T, ClientError>;

/// A Result type with EngineError.
pub type EngineResult<T> = Result<T, EngineError>;

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_error_retryable() {
        assert!(EngineError::timeout(Duration::from_secs(5)).is_retryable());
        assert!(EngineError::connection_failed("Sim.1", "refused").is_retryable());
        assert!(EngineError::NotConnected.is_retryable());
        assert!(!EngineError::already_subscribed("Area1.Temp").is_retryable());
        assert!(!EngineError::browse("Area1", "rejected").is_retryable());
    }

    #[test]
    fn test_engine_error_context() {
        let error = EngineError::subscription_creation("Area1.Temp", "server refused");
        assert!(error.to_string().contains("Area1.Temp"));
        assert!(error.to_string().contains("server refused"));

        let error = EngineError::connection_failed("Sim.1", "no route");
        assert!(error.to_string().contains("Sim.1"));
    }

    #[test]
    fn test_engine_error_type() {
        assert_eq!(EngineError::NotConnected.error_type(), "not_connected");
        assert_eq!(
            EngineError::already_subscribed("t").error_type(),
            "already_subscribed"
        );
        assert_eq!(EngineError::tag_read("t", "m").error_type(), "tag_read");
    }

    #[test]
    fn test_client_error_wrapping() {
        let client = ClientError::transport("connection reset");
        let engine = EngineError::connection_failed_with("Sim.1", client);

        match engine {
            EngineError::ConnectionFailed { server, source, .. } => {
                assert_eq!(server, "Sim.1");
                assert!(source.is_some());
            }
            _ => panic!("Expected ConnectionFailed"),
        }
    }

    #[test]
    fn test_client_error_retryable() {
        assert!(ClientError::transport("reset").is_retryable());
        assert!(ClientError::NotConnected.is_retryable());
        assert!(!ClientError::item_not_found("Area1.Temp").is_retryable());
    }
}
