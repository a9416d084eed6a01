// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # tagbridge-engine
//!
//! The TagBridge tag subscription and live data aggregation engine.
//!
//! One engine instance coordinates one connection to an external tag
//! server: it discovers the hierarchical namespace, tracks exactly one
//! subscription per tag, aggregates asynchronous change notifications
//! into a consistent live value store, and assembles point-in-time export
//! snapshots.
//!
//! ## Components
//!
//! - [`ConnectionManager`] - session lifecycle and state machine
//! - [`NamespaceBrowser`] - stateless branch/tag discovery
//! - [`SubscriptionRegistry`] - per-tag subscription handles and
//!   uniqueness
//! - [`LiveValueStore`] - concurrently updated latest-value map
//! - [`SnapshotBuilder`] - fresh read-back export assembly
//! - [`Engine`] - facade wiring the above with orderly teardown
//!
//! ## Example
//!
//! ```rust,ignore
//! use tagbridge_engine::Engine;
//! use tagbridge_core::types::{ServerDescriptor, TagId};
//! use std::time::Duration;
//!
//! let engine = Engine::new(client);
//! engine.connect(&ServerDescriptor::new("Sim.1"), Duration::from_secs(5)).await?;
//!
//! for branch in engine.list_branches(None).await? {
//!     println!("{}", branch.name);
//! }
//!
//! engine.subscribe(TagId::new("Area1.Temp"), "Temp").await?;
//! let records = engine.build_snapshot("Sim.1").await?;
//! engine.shutdown().await?;
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod browser;
pub mod connection;
pub mod engine;
pub mod export;
pub mod ingest;
pub mod registry;
pub mod store;

// =============================================================================
// Re-exports for convenience
// =============================================================================

pub use browser::NamespaceBrowser;
pub use connection::ConnectionManager;
pub use engine::Engine;
pub use export::SnapshotBuilder;
pub use ingest::{IngestStats, IngestStatsSnapshot};
pub use registry::{SubscriptionHandle, SubscriptionRegistry};
pub use store::LiveValueStore;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
