//! Discovered namespace tree.
//!
//! Nodes are stored in a flat `Vec` with parent/children relationships
//! tracked by indices. The root is always index 0. Private nodes never
//! enter the tree.

use std::collections::HashMap;

use grove_namespace::NodeMarkers;

use crate::segment::{SegmentDescriptor, url_pattern};

/// Index of a node in a [`NamespaceTree`].
pub type NodeId = usize;

/// One routable namespace node.
#[derive(Debug)]
pub struct NamespaceNode {
    /// Raw provider path, e.g. `"users/_user_id_"`.
    pub path: String,
    /// Normalized segments from the root, empty for the root itself.
    pub segments: Vec<SegmentDescriptor>,
    pub markers: NodeMarkers,
}

/// Immutable tree produced by the walker.
#[derive(Debug)]
pub struct NamespaceTree {
    nodes: Vec<NamespaceNode>,
    children: Vec<Vec<NodeId>>,
    parents: Vec<Option<NodeId>>,
    path_index: HashMap<String, NodeId>,
}

impl NamespaceTree {
    pub(crate) fn with_root(markers: NodeMarkers) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            children: Vec::new(),
            parents: Vec::new(),
            path_index: HashMap::new(),
        };
        tree.push(
            NamespaceNode {
                path: String::new(),
                segments: Vec::new(),
                markers,
            },
            None,
        );
        tree
    }

    pub(crate) fn push(&mut self, node: NamespaceNode, parent: Option<NodeId>) -> NodeId {
        let id = self.nodes.len();
        self.path_index.insert(node.path.clone(), id);
        self.nodes.push(node);
        self.children.push(Vec::new());
        self.parents.push(parent);
        if let Some(parent) = parent {
            self.children[parent].push(id);
        }
        id
    }

    #[must_use]
    pub fn root(&self) -> NodeId {
        0
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> &NamespaceNode {
        &self.nodes[id]
    }

    /// Look up a node by raw provider path.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<NodeId> {
        self.path_index.get(path).copied()
    }

    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.children[id]
    }

    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parents[id]
    }

    /// Ancestors of `id` ordered from the root down to its parent.
    #[must_use]
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut chain = Vec::new();
        let mut current = self.parents[id];
        while let Some(ancestor) = current {
            chain.push(ancestor);
            current = self.parents[ancestor];
        }
        chain.reverse();
        chain
    }

    /// URL pattern of the node, e.g. `"/users/{user_id}"`.
    #[must_use]
    pub fn url_pattern(&self, id: NodeId) -> String {
        url_pattern(&self.nodes[id].segments)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in discovery order (parents before children).
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &NamespaceNode)> {
        self.nodes.iter().enumerate()
    }
}
