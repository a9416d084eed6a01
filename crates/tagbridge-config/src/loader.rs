// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration loading.
//!
//! Configuration is read from a YAML document, selected fields can be
//! overridden via `TAGBRIDGE_*` environment variables, and the merged
//! result is validated before use.
//!
//! Supported overrides:
//!
//! - `TAGBRIDGE_SERVER_NAME`
//! - `TAGBRIDGE_CONNECT_TIMEOUT_MS`
//! - `TAGBRIDGE_UPDATE_RATE_MS`
//! - `TAGBRIDGE_LOG_LEVEL`
//! - `TAGBRIDGE_LOG_FORMAT`

use std::path::Path;

use crate::error::{ConfigError, ConfigResult};
use crate::schema::BridgeConfig;

/// Loads, overrides, and validates a configuration file.
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<BridgeConfig> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;

    let mut config = parse_config(&contents, path)?;
    apply_env_overrides(&mut config);
    config.validate()?;

    tracing::debug!(path = %path.display(), server = %config.server.name, "configuration loaded");
    Ok(config)
}

/// Parses a configuration document from a string.
///
/// The path is only used for error reporting.
pub fn parse_config(contents: &str, path: impl AsRef<Path>) -> ConfigResult<BridgeConfig> {
    serde_yaml::from_str(contents).map_err(|e| ConfigError::parse(path.as_ref(), e.to_string()))
}

/// Applies `TAGBRIDGE_*` environment overrides in place.
pub fn apply_env_overrides(config: &mut BridgeConfig) {
    if let Ok(name) = std::env::var("TAGBRIDGE_SERVER_NAME") {
        config.server.name = name;
    }
    if let Some(ms) = env_u64("TAGBRIDGE_CONNECT_TIMEOUT_MS") {
        config.server.connect_timeout_ms = ms;
    }
    if let Some(ms) = env_u64("TAGBRIDGE_UPDATE_RATE_MS") {
        config.subscription.update_rate_ms = ms;
    }
    if let Ok(level) = std::env::var("TAGBRIDGE_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Ok(format) = std::env::var("TAGBRIDGE_LOG_FORMAT") {
        config.logging.format = format;
    }
}

fn env_u64(key: &str) -> Option<u64> {
    match std::env::var(key) {
        Ok(raw) => match raw.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(key, raw, "ignoring non-numeric environment override");
                None
            }
        },
        Err(_) => None,
    }
}

// =============================================================================
// Tests
// =============================================================================
