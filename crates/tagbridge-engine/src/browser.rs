// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Namespace browsing.
//!
//! The [`NamespaceBrowser`] issues hierarchical browse requests against
//! the active connection. It keeps no state between calls; every result
//! reflects the server's namespace at the moment of the request, in the
//! order the server returned it.

use std::sync::Arc;

use tagbridge_core::client::{BrowseFilter, TagServerClient};
use tagbridge_core::error::{EngineError, EngineResult};
use tagbridge_core::types::{BranchNode, TagDescriptor};

use crate::connection::ConnectionManager;

/// Scope label used in errors for root-level browses.
const ROOT_SCOPE: &str = "<root>";

// =============================================================================
// NamespaceBrowser
// =============================================================================

/// Stateless browser over the active connection.
pub struct NamespaceBrowser<C> {
    connection: Arc<ConnectionManager<C>>,
}

impl<C: TagServerClient> NamespaceBrowser<C> {
    /// Creates a browser over the given connection.
    pub fn new(connection: Arc<ConnectionManager<C>>) -> Self {
        Self { connection }
    }

    /// Lists branches under `parent`, or the top-level branches when
    /// `parent` is `None`. Only entries that themselves have children are
    /// returned; server ordering is preserved.
    ///
    /// # Errors
    ///
    /// - [`EngineError::NotConnected`] - no active connection
    /// - [`EngineError::Browse`] - the server rejected the request
    pub async fn list_branches(&self, parent: Option<&str>) -> EngineResult<Vec<BranchNode>> {
        if !self.connection.is_connected() {
            return Err(EngineError::NotConnected);
        }
        let scope = parent.unwrap_or(ROOT_SCOPE);

        let elements = {
            let client = self.connection.client();
            let client = client.lock().await;
            client
                .browse(parent, BrowseFilter::Branch)
                .await
                .map_err(|e| EngineError::browse(scope, e.to_string()))?
        };

        let branches: Vec<BranchNode> = elements
            .into_iter()
            .filter(|el| el.has_children)
            .map(|el| BranchNode::new(el.name, true))
            .collect();

        tracing::debug!(scope, count = branches.len(), "listed branches");
        Ok(branches)
    }

    /// Lists the leaf tags directly under `branch`.
    ///
    /// An empty branch yields an empty sequence, not an error.
    ///
    /// # Errors
    ///
    /// - [`EngineError::NotConnected`] - no active connection
    /// - [`EngineError::Browse`] - the server rejected the request
    pub async fn list_tags(&self, branch: &str) -> EngineResult<Vec<TagDescriptor>> {
        if !self.connection.is_connected() {
            return Err(EngineError::NotConnected);
        }

        let elements = {
            let client = self.connection.client();
            let client = client.lock().await;
            client
                .browse(Some(branch), BrowseFilter::Item)
                .await
                .map_err(|e| EngineError::browse(branch, e.to_string()))?
        };

        let tags: Vec<TagDescriptor> = elements
            .into_iter()
            .map(|el| TagDescriptor::new(el.name, el.item_id))
            .collect();

        tracing::debug!(branch, count = tags.len(), "listed tags");
        Ok(tags)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tagbridge_core::types::{ServerDescriptor, Value};
    use tagbridge_sim::{SimBranch, SimNamespace, SimTagServer};

    async fn connected_browser(ns: SimNamespace) -> NamespaceBrowser<SimTagServer> {
        let connection = Arc::new(ConnectionManager::new(SimTagServer::new(ns)));
        connection
            .connect(&ServerDescriptor::new("Sim.1"), Duration::from_secs(1))
            .await
            .unwrap();
        NamespaceBrowser::new(connection)
    }

    #[tokio::test]
    async fn test_list_branches_top_level() {
        let browser = connected_browser(SimNamespace::demo()).await;
        let branches = browser.list_branches(None).await.unwrap();
        let names: Vec<&str> = branches.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["Area1", "Area2"]);
    }

    #[tokio::test]
    async fn test_list_branches_skips_empty() {
        let ns = SimNamespace::demo().with_branch(SimBranch::new("Empty"));
        let browser = connected_browser(ns).await;

        let branches = browser.list_branches(None).await.unwrap();
        assert!(branches.iter().all(|b| b.name != "Empty"));
    }

    #[tokio::test]
    async fn test_list_nested_branches() {
        let ns = SimNamespace::new().with_branch(
            SimBranch::new("Plant")
                .with_child(SimBranch::new("Line1").with_tag("Speed", Value::Float64(1.0)))
                .with_child(SimBranch::new("Line2").with_tag("Speed", Value::Float64(2.0))),
        );
        let browser = connected_browser(ns).await;

        let children = browser.list_branches(Some("Plant")).await.unwrap();
        let names: Vec<&str> = children.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["Line1", "Line2"]);
    }

    #[tokio::test]
    async fn test_list_tags() {
        let browser = connected_browser(SimNamespace::demo()).await;
        let tags = browser.list_tags("Area1").await.unwrap();

        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].name, "Temp");
        assert_eq!(tags[0].item_id.as_str(), "Area1.Temp");
    }

    #[tokio::test]
    async fn test_list_tags_empty_branch() {
        let ns = SimNamespace::demo()
            .with_branch(SimBranch::new("Shell").with_child(SimBranch::new("Inner").with_tag(
                "X",
                Value::Float64(0.0),
            )));
        let browser = connected_browser(ns).await;

        // A branch with only sub-branches has no leaf tags; empty, not an error.
        let tags = browser.list_tags("Shell").await.unwrap();
        assert!(tags.is_empty());
    }

    #[tokio::test]
    async fn test_browse_requires_connection() {
        let connection = Arc::new(ConnectionManager::new(SimTagServer::new(
            SimNamespace::demo(),
        )));
        let browser = NamespaceBrowser::new(connection);

        assert!(matches!(
            browser.list_branches(None).await,
            Err(EngineError::NotConnected)
        ));
        assert!(matches!(
            browser.list_tags("Area1").await,
            Err(EngineError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn test_browse_unknown_branch() {
        let browser = connected_browser(SimNamespace::demo()).await;
        let err = browser.list_tags("Area9").await.unwrap_err();
        assert_eq!(err.error_type(), "browse");
        assert!(err.to_string().contains("Area9"));
    }
}
