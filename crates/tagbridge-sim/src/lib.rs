// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # tagbridge-sim
//!
//! An in-process simulated tag server for TagBridge.
//!
//! The simulator implements the [`TagServerClient`] and
//! [`ServerEnumerator`] contracts from `tagbridge-core` against a static
//! in-memory namespace, so the engine can be exercised end-to-end without
//! a real server: integration tests drive it directly, and the CLI demo
//! uses it as its backing server.
//!
//! ## Example
//!
//! ```rust,ignore
//! use tagbridge_sim::{SimNamespace, SimTagServer};
//! use tagbridge_core::types::{ServerDescriptor, Value};
//! use tagbridge_core::client::TagServerClient;
//!
//! let server = SimTagServer::new(SimNamespace::demo());
//! let mut client = server.clone();
//! client.connect(&ServerDescriptor::new("Sim.1")).await?;
//!
//! server.push_value("Area1.Temp", Value::Float64(73.0)).await;
//! ```
//!
//! [`TagServerClient`]: tagbridge_core::client::TagServerClient
//! [`ServerEnumerator`]: tagbridge_core::client::ServerEnumerator

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod catalog;
pub mod namespace;
pub mod server;

pub use catalog::SimServerCatalog;
pub use namespace::{SimBranch, SimNamespace, SimTag};
pub use server::SimTagServer;
