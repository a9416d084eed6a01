// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Simulated server enumeration.

use async_trait::async_trait;

use tagbridge_core::client::ServerEnumerator;
use tagbridge_core::error::{ClientError, ClientResult};
use tagbridge_core::types::ServerDescriptor;

/// A fixed catalog of discoverable simulated servers.
#[derive(Debug, Clone)]
pub struct SimServerCatalog {
    servers: Vec<ServerDescriptor>,
    fail: bool,
}

impl SimServerCatalog {
    /// Creates a catalog listing `"Sim.1"`.
    pub fn new() -> Self {
        Self::with_servers(["Sim.1"])
    }

    /// Creates a catalog with the given server names, in order.
    pub fn with_servers(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            servers: names
                .into_iter()
                .map(|n| ServerDescriptor::new(n))
                .collect(),
            fail: false,
        }
    }

    /// Makes enumeration fail, for error-path tests.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

impl Default for SimServerCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ServerEnumerator for SimServerCatalog {
    async fn list_servers(&self) -> ClientResult<Vec<ServerDescriptor>> {
        if self.fail {
            return Err(ClientError::enumeration("simulated enumeration failure"));
        }
        Ok(self.servers.clone())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_catalog_order_preserved() {
        let catalog = SimServerCatalog::with_servers(["Sim.2", "Sim.1"]);
        let servers = catalog.list_servers().await.unwrap();
        assert_eq!(servers[0].name, "Sim.2");
        assert_eq!(servers[1].name, "Sim.1");
    }

    #[tokio::test]
    async fn test_catalog_failure_surfaced() {
        let catalog = SimServerCatalog::new().failing();
        let err = catalog.list_servers().await.unwrap_err();
        assert_eq!(err.error_type(), "enumeration");
    }
}
