// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # tagbridge-config
//!
//! Configuration management for TagBridge.
//!
//! Configuration lives in a YAML document and is organized into sections:
//!
//! - `server` - target server name and connect deadline
//! - `subscription` - update rate and notification channel sizing
//! - `startup` - tags subscribed when the bridge starts
//! - `logging` - level and output format
//!
//! Selected values can be overridden via `TAGBRIDGE_*` environment
//! variables.
//!
//! ## Quick Start
//!
//! ```no_run
//! use tagbridge_config::load_config;
//!
//! let config = load_config("tagbridge.yaml").unwrap();
//! println!("Server: {}", config.server.name);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod loader;
pub mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{apply_env_overrides, load_config, parse_config};
pub use schema::{
    BridgeConfig, LoggingSection, ServerSection, StartupSection, SubscriptionSection,
};
