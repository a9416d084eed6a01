// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # tagbridge-core
//!
//! Core abstractions and shared types for the TagBridge tag subscription
//! and live data aggregation engine.
//!
//! This crate provides the foundation used across all TagBridge components:
//!
//! - **Types**: `TagId`, `ServerDescriptor`, `ConnectionState`, `Value`,
//!   `LiveValue`, `ExportRecord`, and the namespace entry types
//! - **Error**: the `ClientError`/`EngineError` hierarchy
//! - **Client**: the `TagServerClient` and `ServerEnumerator` traits the
//!   engine consumes from external collaborators
//! - **Notify**: the explicit change-notification channel that replaces
//!   callback-style delivery
//!
//! ## Example
//!
//! ```
//! use tagbridge_core::types::{TagId, LiveValue};
//! use chrono::Utc;
//!
//! let id = TagId::new("Area1.Temp");
//! assert_eq!(id.branch_name(), "Area1");
//!
//! let live = LiveValue::new("72.3", Utc::now());
//! assert!(!live.is_pending());
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod client;
pub mod error;
pub mod notify;
pub mod types;

// =============================================================================
// Re-exports for convenience
// =============================================================================

pub use client::{
    BrowseElement, BrowseFilter, ClientSubscriptionId, ItemReading, ServerEnumerator,
    TagServerClient,
};
pub use error::{ClientError, ClientResult, EngineError, EngineResult};
pub use notify::{
    notification_channel, ChangeBatch, ChangeNotification, NotificationReceiver,
    NotificationSender, DEFAULT_CHANNEL_CAPACITY,
};
pub use types::{
    BranchNode, ConnectionState, ExportRecord, LiveValue, ServerDescriptor, SubscriptionConfig,
    TagDescriptor, TagId, Value, HIERARCHY_SEPARATOR, PENDING_VALUE, ROOT_BRANCH,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
