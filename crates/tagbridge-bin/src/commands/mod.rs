// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! CLI command dispatch.

use crate::cli::{Cli, Commands};
use crate::error::BinResult;

mod discover;
mod run;
mod validate;
mod version;

/// Executes the effective command.
pub async fn dispatch(cli: Cli) -> BinResult<()> {
    match cli.effective_command() {
        Commands::Run(args) => run::execute(&cli, args).await,
        Commands::Validate(args) => validate::execute(&cli, args),
        Commands::Discover(args) => discover::execute(args).await,
        Commands::Version => {
            version::execute();
            Ok(())
        }
    }
}
