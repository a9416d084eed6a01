// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration schema.
//!
//! The configuration is organized into sections:
//!
//! - `server` - which tag server to connect to and with what deadline
//! - `subscription` - update rate and ingestion channel sizing
//! - `startup` - tags to subscribe when the bridge starts
//! - `logging` - log level and output format
//!
//! Every field has a default so an empty document is a valid (if not very
//! useful) configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use tagbridge_core::types::SubscriptionConfig;

use crate::error::{ConfigError, ConfigResult};

// =============================================================================
// BridgeConfig
// =============================================================================

/// Root configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BridgeConfig {
    /// Server connection settings.
    #[serde(default)]
    pub server: ServerSection,

    /// Subscription settings.
    #[serde(default)]
    pub subscription: SubscriptionSection,

    /// Startup behavior.
    #[serde(default)]
    pub startup: StartupSection,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingSection,
}

impl BridgeConfig {
    /// Validates the whole document.
    pub fn validate(&self) -> ConfigResult<()> {
        self.server.validate()?;
        self.subscription.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

// =============================================================================
// Server Section
// =============================================================================

/// Which server to connect to, and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    /// Name of the tag server to connect to.
    #[serde(default = "default_server_name")]
    pub name: String,

    /// Connect deadline in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

impl ServerSection {
    /// Returns the connect deadline as a `Duration`.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::validation("server.name", "must not be empty"));
        }
        if self.connect_timeout_ms == 0 {
            return Err(ConfigError::validation(
                "server.connect_timeout_ms",
                "must be positive",
            ));
        }
        Ok(())
    }
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            name: default_server_name(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

fn default_server_name() -> String {
    "Sim.1".to_string()
}

fn default_connect_timeout_ms() -> u64 {
    5000
}

// =============================================================================
// Subscription Section
// =============================================================================

/// Settings for server-side subscriptions and notification ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubscriptionSection {
    /// Server update interval in milliseconds.
    #[serde(default = "default_update_rate_ms")]
    pub update_rate_ms: u64,

    /// Capacity of the inbound notification channel.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl SubscriptionSection {
    /// Converts this section into the engine's subscription settings.
    pub fn to_subscription_config(&self) -> SubscriptionConfig {
        SubscriptionConfig::new(Duration::from_millis(self.update_rate_ms))
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.update_rate_ms == 0 {
            return Err(ConfigError::validation(
                "subscription.update_rate_ms",
                "must be positive",
            ));
        }
        if self.channel_capacity == 0 {
            return Err(ConfigError::validation(
                "subscription.channel_capacity",
                "must be positive",
            ));
        }
        Ok(())
    }
}

impl Default for SubscriptionSection {
    fn default() -> Self {
        Self {
            update_rate_ms: default_update_rate_ms(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

fn default_update_rate_ms() -> u64 {
    1000
}

fn default_channel_capacity() -> usize {
    1024
}

// =============================================================================
// Startup Section
// =============================================================================

/// What the bridge does right after connecting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StartupSection {
    /// Fully-qualified tag identifiers to subscribe at startup.
    #[serde(default)]
    pub subscribe: Vec<String>,
}

// =============================================================================
// Logging Section
// =============================================================================

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (text, json, compact).
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl LoggingSection {
    fn validate(&self) -> ConfigResult<()> {
        match self.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "warning" | "error" => {}
            other => {
                return Err(ConfigError::validation(
                    "logging.level",
                    format!("unknown level '{}'", other),
                ))
            }
        }
        match self.format.to_lowercase().as_str() {
            "text" | "json" | "compact" => Ok(()),
            other => Err(ConfigError::validation(
                "logging.format",
                format!("unknown format '{}'", other),
            )),
        }
    }
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = BridgeConfig::default();
        config.validate().unwrap();
        assert_eq!(config.server.name, "Sim.1");
        assert_eq!(config.subscription.update_rate_ms, 1000);
        assert!(config.startup.subscribe.is_empty());
    }

    #[test]
    fn test_update_rate_conversion() {
        let section = SubscriptionSection {
            update_rate_ms: 250,
            ..Default::default()
        };
        assert_eq!(
            section.to_subscription_config().update_rate,
            Duration::from_millis(250)
        );
    }

    #[test]
    fn test_rejects_zero_update_rate() {
        let config = BridgeConfig {
            subscription: SubscriptionSection {
                update_rate_ms: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_empty_server_name() {
        let config = BridgeConfig {
            server: ServerSection {
                name: "  ".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_unknown_log_level() {
        let config = BridgeConfig {
            logging: LoggingSection {
                level: "loud".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
