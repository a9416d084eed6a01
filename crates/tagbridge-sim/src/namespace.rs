// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Simulated namespace model.
//!
//! A [`SimNamespace`] is a static tree of branches and tags describing
//! what the simulated server exposes to browse calls. Fully-qualified
//! identifiers are dotted paths (`Area1.Temp`); tags attached directly to
//! the namespace root have no separator.

use tagbridge_core::types::{TagId, Value, HIERARCHY_SEPARATOR};

// =============================================================================
// SimTag
// =============================================================================

/// A leaf tag definition.
#[derive(Debug, Clone)]
pub struct SimTag {
    /// Display name (final path segment).
    pub name: String,

    /// Initial value seeded into the server.
    pub initial: Value,
}

impl SimTag {
    /// Creates a tag definition.
    pub fn new(name: impl Into<String>, initial: Value) -> Self {
        Self {
            name: name.into(),
            initial,
        }
    }
}

// =============================================================================
// SimBranch
// =============================================================================

/// A branch definition holding child branches and tags.
#[derive(Debug, Clone)]
pub struct SimBranch {
    /// Branch display name.
    pub name: String,

    /// Child branches, in declaration order.
    pub children: Vec<SimBranch>,

    /// Leaf tags directly under this branch, in declaration order.
    pub tags: Vec<SimTag>,
}

impl SimBranch {
    /// Creates an empty branch.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
            tags: Vec::new(),
        }
    }

    /// Adds a child branch.
    pub fn with_child(mut self, child: SimBranch) -> Self {
        self.children.push(child);
        self
    }

    /// Adds a leaf tag.
    pub fn with_tag(mut self, name: impl Into<String>, initial: Value) -> Self {
        self.tags.push(SimTag::new(name, initial));
        self
    }

    /// Returns `true` if the branch has any children (branches or tags).
    pub fn has_children(&self) -> bool {
        !self.children.is_empty() || !self.tags.is_empty()
    }
}

// =============================================================================
// SimNamespace
// =============================================================================

/// The namespace tree of a simulated server.
#[derive(Debug, Clone, Default)]
pub struct SimNamespace {
    /// Top-level branches, in declaration order.
    pub branches: Vec<SimBranch>,

    /// Tags attached directly to the root, in declaration order.
    pub root_tags: Vec<SimTag>,
}

impl SimNamespace {
    /// Creates an empty namespace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a top-level branch.
    pub fn with_branch(mut self, branch: SimBranch) -> Self {
        self.branches.push(branch);
        self
    }

    /// Adds a tag directly under the root.
    pub fn with_root_tag(mut self, name: impl Into<String>, initial: Value) -> Self {
        self.root_tags.push(SimTag::new(name, initial));
        self
    }

    /// Resolves a dotted branch path to its branch, if present.
    pub fn find_branch(&self, path: &str) -> Option<&SimBranch> {
        let mut segments = path.split(HIERARCHY_SEPARATOR);
        let first = segments.next()?;
        let mut current = self.branches.iter().find(|b| b.name == first)?;
        for segment in segments {
            current = current.children.iter().find(|b| b.name == segment)?;
        }
        Some(current)
    }

    /// Returns `true` if the fully-qualified identifier names a tag in
    /// this namespace.
    pub fn contains_tag(&self, id: &TagId) -> bool {
        match id.parent_path() {
            None => self.root_tags.iter().any(|t| t.name == id.as_str()),
            Some(parent) => self
                .find_branch(parent)
                .map(|b| b.tags.iter().any(|t| t.name == id.leaf_name()))
                .unwrap_or(false),
        }
    }

    /// Walks every tag with its fully-qualified identifier.
    pub fn all_tags(&self) -> Vec<(TagId, Value)> {
        let mut out = Vec::new();
        for tag in &self.root_tags {
            out.push((TagId::new(&tag.name), tag.initial.clone()));
        }
        for branch in &self.branches {
            collect_tags(branch, &branch.name, &mut out);
        }
        out
    }

    /// The demo namespace used by tests and the CLI: two process areas
    /// plus a root-level status tag.
    pub fn demo() -> Self {
        Self::new()
            .with_branch(
                SimBranch::new("Area1")
                    .with_tag("Temp", Value::Float64(72.3))
                    .with_tag("Pressure", Value::Float64(1.2)),
            )
            .with_branch(
                SimBranch::new("Area2")
                    .with_tag("Flow", Value::Float64(30.0))
                    .with_tag("Level", Value::Float64(55.5)),
            )
            .with_root_tag("Status", Value::String("ok".to_string()))
    }
}

fn collect_tags(branch: &SimBranch, path: &str, out: &mut Vec<(TagId, Value)>) {
    for tag in &branch.tags {
        out.push((
            TagId::new(format!("{}{}{}", path, HIERARCHY_SEPARATOR, tag.name)),
            tag.initial.clone(),
        ));
    }
    for child in &branch.children {
        let child_path = format!("{}{}{}", path, HIERARCHY_SEPARATOR, child.name);
        collect_tags(child, &child_path, out);
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_branch() {
        let ns = SimNamespace::demo();
        assert!(ns.find_branch("Area1").is_some());
        assert!(ns.find_branch("Area3").is_none());

        let nested = SimNamespace::new().with_branch(
            SimBranch::new("Plant").with_child(SimBranch::new("Line1").with_tag(
                "Speed",
                Value::Float64(1.0),
            )),
        );
        assert!(nested.find_branch("Plant.Line1").is_some());
        assert!(nested.find_branch("Plant.Line2").is_none());
    }

    #[test]
    fn test_contains_tag() {
        let ns = SimNamespace::demo();
        assert!(ns.contains_tag(&TagId::new("Area1.Temp")));
        assert!(ns.contains_tag(&TagId::new("Status")));
        assert!(!ns.contains_tag(&TagId::new("Area1.Humidity")));
        assert!(!ns.contains_tag(&TagId::new("Area9.Temp")));
    }

    #[test]
    fn test_all_tags_includes_nested() {
        let ns = SimNamespace::new().with_branch(
            SimBranch::new("Plant")
                .with_tag("Mode", Value::String("auto".into()))
                .with_child(SimBranch::new("Line1").with_tag("Speed", Value::Float64(1.0))),
        );

        let tags = ns.all_tags();
        let ids: Vec<&str> = tags.iter().map(|(id, _)| id.as_str()).collect();
        assert!(ids.contains(&"Plant.Mode"));
        assert!(ids.contains(&"Plant.Line1.Speed"));
    }

    #[test]
    fn test_demo_shape() {
        let ns = SimNamespace::demo();
        assert_eq!(ns.branches.len(), 2);
        assert_eq!(ns.branches[0].name, "Area1");
        assert_eq!(ns.branches[1].name, "Area2");
        assert_eq!(ns.root_tags.len(), 1);
        assert_eq!(ns.all_tags().len(), 5);
    }
}
