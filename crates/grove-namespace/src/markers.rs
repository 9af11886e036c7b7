//! Marker entities a namespace node may carry.

use std::fmt;
use std::sync::Arc;

use crate::context::Method;
use crate::handler::{ErrorHandlers, Handler, Layout, MetadataSource};

/// An extra endpoint attached to a node.
///
/// Mounted at the node's URL plus `path`, or plus the action name with `_`
/// replaced by `-` when no path is given. Actions are served bare unless
/// `with_layout` is set.
#[derive(Clone)]
pub struct ActionDef {
    pub name: String,
    /// Relative path override, e.g. `"/items/{item_id}"`.
    pub path: Option<String>,
    /// Methods answered; defaults to GET.
    pub methods: Vec<Method>,
    pub with_layout: bool,
    pub metadata: Option<MetadataSource>,
    pub handler: Arc<dyn Handler>,
}

impl ActionDef {
    pub fn new(name: impl Into<String>, handler: Arc<dyn Handler>) -> Self {
        Self {
            name: name.into(),
            path: None,
            methods: vec![Method::Get],
            with_layout: false,
            metadata: None,
            handler,
        }
    }

    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.methods = methods.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_layout(mut self, with_layout: bool) -> Self {
        self.with_layout = with_layout;
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: impl Into<MetadataSource>) -> Self {
        self.metadata = Some(metadata.into());
        self
    }
}

impl fmt::Debug for ActionDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionDef")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("methods", &self.methods)
            .field("with_layout", &self.with_layout)
            .finish_non_exhaustive()
    }
}

/// A plain route contributed by an API factory. Never layout-wrapped.
#[derive(Clone)]
pub struct ApiRoute {
    pub method: Method,
    /// Path relative to the node, `""` for the node itself.
    pub path: String,
    /// Short name used in the route's stable name.
    pub name: String,
    pub handler: Arc<dyn Handler>,
}

impl ApiRoute {
    pub fn new(
        method: Method,
        path: impl Into<String>,
        name: impl Into<String>,
        handler: Arc<dyn Handler>,
    ) -> Self {
        Self {
            method,
            path: path.into(),
            name: name.into(),
            handler,
        }
    }
}

/// Produces the API routes mounted under a node.
pub trait ApiFactory: Send + Sync {
    fn routes(&self) -> Vec<ApiRoute>;
}

impl<F> ApiFactory for F
where
    F: Fn() -> Vec<ApiRoute> + Send + Sync,
{
    fn routes(&self) -> Vec<ApiRoute> {
        self()
    }
}

/// Everything recognized at one namespace node.
#[derive(Clone, Default)]
pub struct NodeMarkers {
    /// Structured layout; wins over a template layout at the same node.
    pub layout: Option<Arc<dyn Layout>>,
    /// Whether a template layout resource exists at this node.
    pub template_layout: bool,
    pub page: Option<Arc<dyn Handler>>,
    pub submit_handler: Option<Arc<dyn Handler>>,
    pub metadata: Option<MetadataSource>,
    pub actions: Vec<ActionDef>,
    pub apis: Vec<Arc<dyn ApiFactory>>,
    /// Only honored at the root node.
    pub error_handlers: Option<ErrorHandlers>,
}

impl NodeMarkers {
    /// Whether the node contributes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layout.is_none()
            && !self.template_layout
            && self.page.is_none()
            && self.submit_handler.is_none()
            && self.metadata.is_none()
            && self.actions.is_empty()
            && self.apis.is_empty()
            && self.error_handlers.is_none()
    }
}

impl fmt::Debug for NodeMarkers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeMarkers")
            .field("layout", &self.layout.is_some())
            .field("template_layout", &self.template_layout)
            .field("page", &self.page.is_some())
            .field("submit_handler", &self.submit_handler.is_some())
            .field("metadata", &self.metadata)
            .field("actions", &self.actions)
            .field("apis", &self.apis.len())
            .field(
                "error_handlers",
                &self.error_handlers.as_ref().map(|h| h.keys().collect::<Vec<_>>()),
            )
            .finish()
    }
}
