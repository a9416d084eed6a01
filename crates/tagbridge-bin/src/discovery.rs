// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Network host discovery.
//!
//! An independent helper with no shared state with the engine: it reads
//! the machine's ARP cache (`arp -a`) and reports the IPv4 hosts found
//! there, as candidates that may be running a tag server. Progress is
//! reported over an mpsc channel so a caller can render it while the
//! scan runs.

use std::collections::BTreeSet;

use regex::Regex;
use tokio::process::Command;
use tokio::sync::mpsc;

use crate::error::{BinError, BinResult};

/// A progress event emitted during discovery.
#[derive(Debug, Clone)]
pub struct DiscoveryProgress {
    /// Human-readable status line.
    pub message: String,

    /// Percent complete, or `-1` for intermediate findings.
    pub percent: i32,
}

impl DiscoveryProgress {
    fn new(message: impl Into<String>, percent: i32) -> Self {
        Self {
            message: message.into(),
            percent,
        }
    }
}

/// Discovers hosts from the local ARP cache.
///
/// Loopback and multicast addresses are excluded; the result is sorted
/// and deduplicated. When `progress` is given, status events are sent as
/// the scan advances (a closed receiver is tolerated).
pub async fn discover_hosts(
    progress: Option<mpsc::Sender<DiscoveryProgress>>,
) -> BinResult<Vec<String>> {
    report(&progress, "Starting network discovery...", 0).await;
    report(&progress, "Reading ARP cache...", 50).await;

    let output = Command::new("arp")
        .arg("-a")
        .output()
        .await
        .map_err(|e| BinError::discovery(format!("failed to run arp: {}", e)))?;

    if !output.status.success() {
        return Err(BinError::discovery(format!(
            "arp exited with {}",
            output.status
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let hosts = extract_hosts(&stdout);

    for host in &hosts {
        report(&progress, format!("Found host: {}", host), -1).await;
    }
    report(
        &progress,
        format!("Discovery complete. Found {} hosts.", hosts.len()),
        100,
    )
    .await;

    Ok(hosts)
}

/// Extracts candidate host addresses from `arp -a` output.
pub fn extract_hosts(output: &str) -> Vec<String> {
    let ip_pattern = Regex::new(r"(\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})").expect("static pattern");

    let hosts: BTreeSet<String> = ip_pattern
        .find_iter(output)
        .map(|m| m.as_str().to_string())
        .filter(|ip| !is_excluded(ip))
        .collect();

    hosts.into_iter().collect()
}

/// Loopback and multicast addresses never host a reachable tag server.
fn is_excluded(ip: &str) -> bool {
    ip == "127.0.0.1" || ip.starts_with("224.") || ip.starts_with("239.")
}

async fn report(
    progress: &Option<mpsc::Sender<DiscoveryProgress>>,
    message: impl Into<String>,
    percent: i32,
) {
    if let Some(tx) = progress {
        let _ = tx.send(DiscoveryProgress::new(message, percent)).await;
    }
}

// =============================================================================
// Tests
// =============================================================================
