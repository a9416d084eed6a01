// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! TagBridge CLI entry point.

use tagbridge_bin::{cli::Cli, commands, logging};

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();
    logging::init_logging(cli.effective_log_level(), cli.log_format);

    if let Err(e) = commands::dispatch(cli).await {
        tracing::error!(error = %e, "tagbridge failed");
        std::process::exit(1);
    }
}
