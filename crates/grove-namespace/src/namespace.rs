//! Namespace provider trait.
//!
//! # Path Convention
//!
//! Nodes are addressed by their raw names joined with `/`, exactly as they
//! appear in the provider:
//! - `""` - root
//! - `"users"` - child of root
//! - `"users/_user_id_"` - parametrized grandchild (not yet normalized)

use crate::error::NamespaceError;
use crate::markers::NodeMarkers;

/// Hierarchical source of routing information.
///
/// Discovery calls [`children`](Namespace::children) to walk the tree and
/// [`markers`](Namespace::markers) for every node that survives private
/// pruning. Names are returned raw; classification is the walker's job.
pub trait Namespace: Send + Sync {
    /// Names of the direct children of a node.
    ///
    /// # Errors
    ///
    /// Returns [`NamespaceError`] if the node doesn't exist or can't be listed.
    fn children(&self, path: &str) -> Result<Vec<String>, NamespaceError>;

    /// Marker entities present at a node.
    ///
    /// # Errors
    ///
    /// Returns [`NamespaceError`] if a marker resource exists but can't be loaded.
    fn markers(&self, path: &str) -> Result<NodeMarkers, NamespaceError>;

    /// Raw text of the node's template layout.
    ///
    /// Only called for nodes whose markers report `template_layout`.
    ///
    /// # Errors
    ///
    /// Returns [`NamespaceError`] if the resource is missing or unreadable.
    fn read_template(&self, path: &str) -> Result<String, NamespaceError>;
}

/// Join a child name onto a namespace path.
#[must_use]
pub fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_owned()
    } else {
        format!("{parent}/{name}")
    }
}

/// Parent path and own name of a namespace path. `None` for the root.
#[must_use]
pub fn split_path(path: &str) -> Option<(&str, &str)> {
    if path.is_empty() {
        return None;
    }
    Some(path.rsplit_once('/').unwrap_or(("", path)))
}
