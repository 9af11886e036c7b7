//! Layout chain building.
//!
//! A node's chain holds the layouts of its ancestors ordered from the root
//! down to its parent. Endpoints hang below their node, so their chain also
//! ends with the node's own layout. Both kinds of chains, and the templates
//! they reference, are computed once per node and shared afterward.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use grove_namespace::{Layout, Namespace, NamespaceErrorKind};

use crate::error::ConfigurationError;
use crate::template::ParsedTemplate;
use crate::tree::{NamespaceTree, NodeId};

/// A text template layout, parsed during discovery.
#[derive(Debug)]
pub struct TemplateLayout {
    pub node: NodeId,
    /// Namespace path of the owning node.
    pub path: String,
    pub template: ParsedTemplate,
}

/// One entry in a layout chain.
#[derive(Clone)]
pub enum LayoutRef {
    Structured {
        node: NodeId,
        path: String,
        layout: Arc<dyn Layout>,
    },
    Template(Arc<TemplateLayout>),
}

impl LayoutRef {
    #[must_use]
    pub fn node(&self) -> NodeId {
        match self {
            Self::Structured { node, .. } => *node,
            Self::Template(template) => template.node,
        }
    }

    /// Namespace path of the node owning this layout.
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::Structured { path, .. } => path,
            Self::Template(template) => &template.path,
        }
    }
}

impl fmt::Debug for LayoutRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Structured { node, path, layout } => f
                .debug_struct("Structured")
                .field("node", node)
                .field("path", path)
                .field("accepts", &layout.accepts())
                .finish(),
            Self::Template(template) => f
                .debug_struct("Template")
                .field("node", &template.node)
                .field("path", &template.path)
                .finish_non_exhaustive(),
        }
    }
}

/// Ordered layouts, outermost (root) first.
pub type LayoutChain = Arc<[LayoutRef]>;

/// Builds and caches layout chains over a walked tree.
pub struct ChainBuilder<'a> {
    tree: &'a NamespaceTree,
    namespace: &'a dyn Namespace,
    own: HashMap<NodeId, Option<LayoutRef>>,
    ancestors: HashMap<NodeId, LayoutChain>,
    endpoints: HashMap<NodeId, LayoutChain>,
}

impl<'a> ChainBuilder<'a> {
    #[must_use]
    pub fn new(tree: &'a NamespaceTree, namespace: &'a dyn Namespace) -> Self {
        Self {
            tree,
            namespace,
            own: HashMap::new(),
            ancestors: HashMap::new(),
            endpoints: HashMap::new(),
        }
    }

    /// The layout contributed by node `id` itself, if any.
    ///
    /// A structured layout wins over a template at the same node. A template
    /// whose resource has disappeared counts as no layout.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::Template`] for malformed templates and
    /// propagates provider failures other than "not found".
    pub fn layout_at(&mut self, id: NodeId) -> Result<Option<LayoutRef>, ConfigurationError> {
        if let Some(cached) = self.own.get(&id) {
            return Ok(cached.clone());
        }

        let node = self.tree.node(id);
        let layout = if let Some(layout) = &node.markers.layout {
            if node.markers.template_layout {
                tracing::debug!(path = %node.path, "Structured layout overrides template layout");
            }
            Some(LayoutRef::Structured {
                node: id,
                path: node.path.clone(),
                layout: Arc::clone(layout),
            })
        } else if node.markers.template_layout {
            match self.namespace.read_template(&node.path) {
                Ok(text) => {
                    let template = ParsedTemplate::parse(&text).map_err(|source| {
                        ConfigurationError::Template {
                            node: node.path.clone(),
                            source,
                        }
                    })?;
                    Some(LayoutRef::Template(Arc::new(TemplateLayout {
                        node: id,
                        path: node.path.clone(),
                        template,
                    })))
                }
                Err(e) if e.kind == NamespaceErrorKind::NotFound => {
                    tracing::debug!(path = %node.path, "Template layout resource missing, passing through");
                    None
                }
                Err(e) => return Err(e.into()),
            }
        } else {
            None
        };

        self.own.insert(id, layout.clone());
        Ok(layout)
    }

    /// Layouts of the ancestors of `id`, root first. Never includes the
    /// node's own layout.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::LayoutCycle`] if the upward walk meets a
    /// node twice, or any error from [`Self::layout_at`].
    pub fn ancestor_chain(&mut self, id: NodeId) -> Result<LayoutChain, ConfigurationError> {
        if let Some(chain) = self.ancestors.get(&id) {
            return Ok(Arc::clone(chain));
        }

        let mut visited = HashSet::from([id]);
        let mut layouts = Vec::new();
        for ancestor in self.tree.ancestors(id) {
            if !visited.insert(ancestor) {
                return Err(ConfigurationError::LayoutCycle {
                    node: self.tree.node(ancestor).path.clone(),
                });
            }
            if let Some(layout) = self.layout_at(ancestor)? {
                layouts.push(layout);
            }
        }

        let chain: LayoutChain = layouts.into();
        self.ancestors.insert(id, Arc::clone(&chain));
        Ok(chain)
    }

    /// Chain for an endpoint mounted at `id`: the ancestor chain followed by
    /// the node's own layout.
    ///
    /// # Errors
    ///
    /// Same as [`Self::ancestor_chain`].
    pub fn endpoint_chain(&mut self, id: NodeId) -> Result<LayoutChain, ConfigurationError> {
        if let Some(chain) = self.endpoints.get(&id) {
            return Ok(Arc::clone(chain));
        }

        let mut layouts = self.ancestor_chain(id)?.to_vec();
        if let Some(own) = self.layout_at(id)? {
            layouts.push(own);
        }

        let chain: LayoutChain = layouts.into();
        self.endpoints.insert(id, Arc::clone(&chain));
        Ok(chain)
    }

    /// Number of nodes that contribute a template layout.
    #[must_use]
    pub fn template_count(&self) -> usize {
        self.own
            .values()
            .filter(|layout| matches!(layout, Some(LayoutRef::Template(_))))
            .count()
    }
}
