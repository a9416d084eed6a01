// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! CLI argument parsing and command definitions.
//!
//! Subcommands:
//!
//! - `run`: connect, subscribe, and aggregate live values (default)
//! - `validate`: check a configuration file without connecting
//! - `discover`: enumerate hosts on the local network
//! - `version`: show version information

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

// =============================================================================
// Main CLI Structure
// =============================================================================

/// TagBridge - browse a tag server, subscribe to tags, aggregate live
/// values, and export point-in-time snapshots.
#[derive(Parser, Debug)]
#[command(
    name = "tagbridge",
    author = "Sylvex <contact@sylvex.io>",
    version = tagbridge_core::VERSION,
    about = "Tag server subscription and live data aggregation bridge",
    long_about = None,
    propagate_version = true
)]
pub struct Cli {
    /// Configuration file path
    #[arg(
        short,
        long,
        default_value = "tagbridge.yaml",
        env = "TAGBRIDGE_CONFIG",
        global = true
    )]
    pub config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        short,
        long,
        default_value = "info",
        env = "TAGBRIDGE_LOG_LEVEL",
        global = true
    )]
    pub log_level: String,

    /// Log format (text, json, compact)
    #[arg(long, default_value = "text", env = "TAGBRIDGE_LOG_FORMAT", global = true)]
    pub log_format: LogFormat,

    /// Enable quiet mode (warnings and errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

// =============================================================================
// Subcommands
// =============================================================================

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Connect to the configured server and aggregate live values
    ///
    /// This is the default command. It connects, subscribes the startup
    /// tags, logs live values as they change, and writes an export
    /// snapshot on shutdown.
    Run(RunArgs),

    /// Validate the configuration file
    ///
    /// Parses and validates the configuration without connecting.
    Validate(ValidateArgs),

    /// Discover hosts on the local network
    ///
    /// Reads the ARP cache and reports reachable machines that may host
    /// tag servers.
    Discover(DiscoverArgs),

    /// Show version information
    Version,
}

// =============================================================================
// Command Arguments
// =============================================================================

/// Arguments for the `run` command.
#[derive(Args, Debug, Default, Clone)]
pub struct RunArgs {
    /// Stop after this many seconds instead of waiting for a signal
    #[arg(long)]
    pub duration_secs: Option<u64>,

    /// Write the shutdown export snapshot to this file instead of stdout
    #[arg(short, long)]
    pub export: Option<PathBuf>,
}

/// Arguments for the `validate` command.
#[derive(Args, Debug, Default, Clone)]
pub struct ValidateArgs {
    /// Show the parsed configuration after validation
    #[arg(short, long)]
    pub show_config: bool,
}

/// Arguments for the `discover` command.
#[derive(Args, Debug, Default, Clone)]
pub struct DiscoverArgs {
    /// Suppress progress messages, print only the host list
    #[arg(long)]
    pub no_progress: bool,
}

// =============================================================================
// Enums
// =============================================================================

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON format for structured logging
    Json,
    /// Compact format for minimal output
    Compact,
}

// =============================================================================
// Helper Methods
// =============================================================================

impl Cli {
    /// Parses CLI arguments from the command line.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the effective command, defaulting to `run`.
    pub fn effective_command(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or_else(|| Commands::Run(RunArgs::default()))
    }

    /// Returns the effective log level based on flags.
    pub fn effective_log_level(&self) -> &str {
        if self.quiet {
            "warn"
        } else if self.verbose {
            "debug"
        } else {
            &self.log_level
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_run() {
        let cli = Cli::parse_from(["tagbridge"]);
        assert!(cli.command.is_none());
        assert!(matches!(cli.effective_command(), Commands::Run(_)));
    }

    #[test]
    fn test_run_with_duration() {
        let cli = Cli::parse_from(["tagbridge", "run", "--duration-secs", "10"]);
        if let Some(Commands::Run(args)) = cli.command {
            assert_eq!(args.duration_secs, Some(10));
        } else {
            panic!("Expected Run command");
        }
    }

    #[test]
    fn test_validate_command() {
        let cli = Cli::parse_from(["tagbridge", "validate", "--show-config"]);
        if let Some(Commands::Validate(args)) = cli.command {
            assert!(args.show_config);
        } else {
            panic!("Expected Validate command");
        }
    }

    #[test]
    fn test_config_path() {
        let cli = Cli::parse_from(["tagbridge", "-c", "/etc/tagbridge/bridge.yaml"]);
        assert_eq!(cli.config, PathBuf::from("/etc/tagbridge/bridge.yaml"));
    }

    #[test]
    fn test_quiet_wins_over_level() {
        let cli = Cli::parse_from(["tagbridge", "-q", "-l", "trace"]);
        assert_eq!(cli.effective_log_level(), "warn");
    }

    #[test]
    fn test_verbose_mode() {
        let cli = Cli::parse_from(["tagbridge", "-v"]);
        assert_eq!(cli.effective_log_level(), "debug");
    }

    #[test]
    fn test_discover_command() {
        let cli = Cli::parse_from(["tagbridge", "discover", "--no-progress"]);
        if let Some(Commands::Discover(args)) = cli.command {
            assert!(args.no_progress);
        } else {
            panic!("Expected Discover command");
        }
    }
}
