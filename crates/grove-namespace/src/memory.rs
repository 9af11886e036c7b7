//! In-code namespace.
//!
//! Provides [`MemoryNamespace`] for declaring a routing tree directly in Rust,
//! and as a bindings overlay for directory-backed namespaces.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::NamespaceError;
use crate::handler::{ErrorHandlers, Handler, Layout, MetadataSource};
use crate::markers::{ActionDef, ApiFactory, NodeMarkers};
use crate::namespace::{Namespace, join_path, split_path};

const BACKEND: &str = "Memory";

#[derive(Default)]
struct Node {
    markers: NodeMarkers,
    template: Option<String>,
}

/// Namespace declared with builder methods.
///
/// Registering a marker at a path creates that node and all of its
/// ancestors.
///
/// # Example
///
/// ```ignore
/// use grove_namespace::{MemoryNamespace, Markup, handler_fn};
///
/// let ns = MemoryNamespace::new()
///     .with_template_layout("", "<html><!-- slot[children] --></html>")
///     .with_page("users/{user_id}", handler_fn(|_| Ok(Markup::raw("<p>user</p>").into())));
/// ```
pub struct MemoryNamespace {
    nodes: BTreeMap<String, Node>,
}

impl Default for MemoryNamespace {
    fn default() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(String::new(), Node::default());
        Self { nodes }
    }
}

impl MemoryNamespace {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn node_mut(&mut self, path: &str) -> &mut Node {
        let mut current = String::new();
        for name in path.split('/').filter(|s| !s.is_empty()) {
            current = join_path(&current, name);
            self.nodes.entry(current.clone()).or_default();
        }
        self.nodes.entry(current).or_default()
    }

    /// Declare an empty node (and its ancestors).
    #[must_use]
    pub fn with_dir(mut self, path: &str) -> Self {
        self.node_mut(path);
        self
    }

    #[must_use]
    pub fn with_page(mut self, path: &str, handler: Arc<dyn Handler>) -> Self {
        self.node_mut(path).markers.page = Some(handler);
        self
    }

    #[must_use]
    pub fn with_submit_handler(mut self, path: &str, handler: Arc<dyn Handler>) -> Self {
        self.node_mut(path).markers.submit_handler = Some(handler);
        self
    }

    #[must_use]
    pub fn with_layout(mut self, path: &str, layout: Arc<dyn Layout>) -> Self {
        self.node_mut(path).markers.layout = Some(layout);
        self
    }

    #[must_use]
    pub fn with_template_layout(mut self, path: &str, template: impl Into<String>) -> Self {
        let node = self.node_mut(path);
        node.markers.template_layout = true;
        node.template = Some(template.into());
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, path: &str, metadata: impl Into<MetadataSource>) -> Self {
        self.node_mut(path).markers.metadata = Some(metadata.into());
        self
    }

    #[must_use]
    pub fn with_action(mut self, path: &str, action: ActionDef) -> Self {
        self.node_mut(path).markers.actions.push(action);
        self
    }

    #[must_use]
    pub fn with_api(mut self, path: &str, factory: Arc<dyn ApiFactory>) -> Self {
        self.node_mut(path).markers.apis.push(factory);
        self
    }

    #[must_use]
    pub fn with_error_handlers(mut self, path: &str, handlers: ErrorHandlers) -> Self {
        self.node_mut(path).markers.error_handlers = Some(handlers);
        self
    }

    /// Markers registered at exactly `path`, if the node exists.
    #[must_use]
    pub fn node_markers(&self, path: &str) -> Option<&NodeMarkers> {
        self.nodes.get(path).map(|node| &node.markers)
    }

    /// Template text registered at exactly `path`.
    #[must_use]
    pub fn template(&self, path: &str) -> Option<&str> {
        self.nodes.get(path)?.template.as_deref()
    }

    /// Names of registered direct children of `path`, sorted.
    #[must_use]
    pub fn child_names(&self, path: &str) -> Vec<String> {
        self.nodes
            .keys()
            .filter_map(|key| match split_path(key) {
                Some((parent, name)) if parent == path => Some(name.to_owned()),
                _ => None,
            })
            .collect()
    }
}

impl Namespace for MemoryNamespace {
    fn children(&self, path: &str) -> Result<Vec<String>, NamespaceError> {
        if !self.nodes.contains_key(path) {
            return Err(NamespaceError::not_found(path).with_backend(BACKEND));
        }
        Ok(self.child_names(path))
    }

    fn markers(&self, path: &str) -> Result<NodeMarkers, NamespaceError> {
        self.node_markers(path)
            .cloned()
            .ok_or_else(|| NamespaceError::not_found(path).with_backend(BACKEND))
    }

    fn read_template(&self, path: &str) -> Result<String, NamespaceError> {
        self.template(path)
            .map(str::to_owned)
            .ok_or_else(|| NamespaceError::not_found(path).with_backend(BACKEND))
    }
}
