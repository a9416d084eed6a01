// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The `discover` command.

use tokio::sync::mpsc;

use crate::cli::DiscoverArgs;
use crate::discovery::{discover_hosts, DiscoveryProgress};
use crate::error::BinResult;

/// Scans the local network for candidate hosts and prints them.
pub async fn execute(args: DiscoverArgs) -> BinResult<()> {
    let hosts = if args.no_progress {
        discover_hosts(None).await?
    } else {
        let (tx, mut rx) = mpsc::channel::<DiscoveryProgress>(32);
        let printer = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if event.percent >= 0 {
                    println!("[{:>3}%] {}", event.percent, event.message);
                } else {
                    println!("       {}", event.message);
                }
            }
        });

        let hosts = discover_hosts(Some(tx)).await?;
        let _ = printer.await;
        hosts
    };

    println!();
    if hosts.is_empty() {
        println!("No hosts found.");
    } else {
        for host in hosts {
            println!("{}", host);
        }
    }
    Ok(())
}
