//! Marker registry.
//!
//! Turns a node's raw [`NodeMarkers`] into routable capabilities: actions and
//! API routes get their final relative paths, colliding actions are
//! rejected, and error handlers are only honored at the root.

use std::fmt;
use std::sync::Arc;

use grove_namespace::{
    ActionDef, ApiRoute, ErrorHandlers, Handler, Layout, MetadataSource, NodeMarkers,
};

use crate::error::ConfigurationError;
use crate::segment::{SegmentDescriptor, parse_relative_path, url_pattern};
use crate::tree::{NamespaceTree, NodeId};

/// An action with its relative path resolved.
#[derive(Debug, Clone)]
pub struct ResolvedAction {
    pub action: ActionDef,
    /// Segments below the node.
    pub segments: Vec<SegmentDescriptor>,
}

/// An API route with its relative path resolved.
#[derive(Clone)]
pub struct ResolvedApiRoute {
    pub route: ApiRoute,
    pub segments: Vec<SegmentDescriptor>,
}

/// Validated capabilities of one node.
#[derive(Default)]
pub struct Capabilities {
    pub layout: Option<Arc<dyn Layout>>,
    pub template_layout: bool,
    pub page: Option<Arc<dyn Handler>>,
    pub submit_handler: Option<Arc<dyn Handler>>,
    pub metadata: Option<MetadataSource>,
    pub actions: Vec<ResolvedAction>,
    pub apis: Vec<ResolvedApiRoute>,
    /// Present only for the root node.
    pub error_handlers: Option<ErrorHandlers>,
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capabilities")
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

/// Default relative path of an action: its name with `_` turned into `-`.
pub(crate) fn default_action_path(name: &str) -> String {
    name.replace('_', "-")
}

fn resolve_action(node: &str, action: &ActionDef) -> Result<ResolvedAction, ConfigurationError> {
    let raw = action
        .path
        .clone()
        .unwrap_or_else(|| default_action_path(&action.name));
    let segments =
        parse_relative_path(&raw).map_err(|source| ConfigurationError::InvalidEndpointPath {
            node: node.to_owned(),
            what: format!("action '{}'", action.name),
            path: raw.clone(),
            source,
        })?;
    Ok(ResolvedAction {
        action: action.clone(),
        segments,
    })
}

fn resolve_api_route(node: &str, route: ApiRoute) -> Result<ResolvedApiRoute, ConfigurationError> {
    let segments =
        parse_relative_path(&route.path).map_err(|source| ConfigurationError::InvalidEndpointPath {
            node: node.to_owned(),
            what: format!("API route '{}'", route.name),
            path: route.path.clone(),
            source,
        })?;
    Ok(ResolvedApiRoute { route, segments })
}

/// Reject two actions answering the same method on the same path.
fn check_action_collisions(node: &str, actions: &[ResolvedAction]) -> Result<(), ConfigurationError> {
    for (i, first) in actions.iter().enumerate() {
        for second in &actions[i + 1..] {
            if first.segments != second.segments {
                continue;
            }
            if let Some(method) = first
                .action
                .methods
                .iter()
                .find(|m| second.action.methods.contains(m))
            {
                return Err(ConfigurationError::ActionCollision {
                    node: node.to_owned(),
                    first: first.action.name.clone(),
                    second: second.action.name.clone(),
                    method: *method,
                    pattern: url_pattern(&first.segments),
                });
            }
        }
    }
    Ok(())
}

/// Inspect the markers of `id`.
///
/// # Errors
///
/// Returns [`ConfigurationError`] for unparseable action or API paths and
/// for colliding actions.
pub fn capabilities(tree: &NamespaceTree, id: NodeId) -> Result<Capabilities, ConfigurationError> {
    let node = tree.node(id);
    let NodeMarkers {
        layout,
        template_layout,
        page,
        submit_handler,
        metadata,
        actions,
        apis,
        error_handlers,
    } = node.markers.clone();

    let actions = actions
        .iter()
        .map(|action| resolve_action(&node.path, action))
        .collect::<Result<Vec<_>, _>>()?;
    check_action_collisions(&node.path, &actions)?;

    let apis = apis
        .iter()
        .flat_map(|factory| factory.routes())
        .map(|route| resolve_api_route(&node.path, route))
        .collect::<Result<Vec<_>, _>>()?;

    let error_handlers = match error_handlers {
        Some(_) if id != tree.root() => {
            tracing::warn!(path = %node.path, "Ignoring error handlers outside the root node");
            None
        }
        handlers => handlers,
    };

    Ok(Capabilities {
        layout,
        template_layout,
        page,
        submit_handler,
        metadata,
        actions,
        apis,
        error_handlers,
    })
}
