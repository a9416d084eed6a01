// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The `run` command.

use tracing::info;

use tagbridge_config::{load_config, BridgeConfig};

use crate::cli::{Cli, RunArgs};
use crate::error::BinResult;
use crate::runtime::BridgeRuntime;

/// Loads configuration and runs the bridge until shutdown.
///
/// A missing configuration file is not an error: the bridge starts with
/// defaults so a bare `tagbridge run` works against the simulator.
pub async fn execute(cli: &Cli, args: RunArgs) -> BinResult<()> {
    let config = if cli.config.exists() {
        load_config(&cli.config)?
    } else {
        info!(path = %cli.config.display(), "no config file found, using defaults");
        BridgeConfig::default()
    };

    BridgeRuntime::new(config).run(args).await
}
