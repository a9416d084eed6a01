// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The `validate` command.

use tagbridge_config::load_config;

use crate::cli::{Cli, ValidateArgs};
use crate::error::{BinError, BinResult};

/// Parses and validates the configuration file without connecting.
pub fn execute(cli: &Cli, args: ValidateArgs) -> BinResult<()> {
    let config = load_config(&cli.config)?;

    println!("Configuration OK: {}", cli.config.display());
    println!("  server: {}", config.server.name);
    println!("  update rate: {} ms", config.subscription.update_rate_ms);
    println!("  startup tags: {}", config.startup.subscribe.len());

    if args.show_config {
        let rendered =
            serde_yaml::to_string(&config).map_err(|e| BinError::output(e.to_string()))?;
        println!("\n{}", rendered);
    }
    Ok(())
}
