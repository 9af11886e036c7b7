//! Route discovery.
//!
//! Walks a namespace once, resolves every node's markers, builds layout
//! chains and emits the final [`RouteTable`].

use std::sync::Arc;

use grove_namespace::{ErrorHandlers, Handler, MetadataSource, Method, Namespace};

use crate::chain::{ChainBuilder, LayoutChain};
use crate::error::ConfigurationError;
use crate::markers::{Capabilities, capabilities, default_action_path};
use crate::route::{RenderOptions, RouteEntry, RouteKind, RouteTable};
use crate::segment::{SegmentDescriptor, url_pattern};
use crate::tree::{NamespaceTree, NodeId};
use crate::walker::walk;

/// Stable route name: the node's normalized segments joined with `.`, then
/// the endpoint suffix.
fn route_name(segments: &[SegmentDescriptor], suffix: &str) -> String {
    if segments.is_empty() {
        return suffix.to_owned();
    }
    let prefix = segments
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(".");
    format!("{prefix}.{suffix}")
}

/// Per-node route emitter.
struct NodeRoutes<'t> {
    tree: &'t NamespaceTree,
    id: NodeId,
    routes: Vec<RouteEntry>,
}

impl NodeRoutes<'_> {
    #[allow(clippy::too_many_arguments)]
    fn push(
        &mut self,
        method: Method,
        kind: RouteKind,
        suffix: &str,
        extra: &[SegmentDescriptor],
        handler: &Arc<dyn Handler>,
        chain: Option<LayoutChain>,
        metadata: Option<MetadataSource>,
    ) {
        let node = self.tree.node(self.id);
        let mut segments = node.segments.clone();
        segments.extend_from_slice(extra);
        self.routes.push(RouteEntry {
            method,
            url_pattern: url_pattern(&segments),
            name: route_name(&node.segments, suffix),
            kind,
            node: self.id,
            node_path: node.path.clone(),
            segments,
            handler: Arc::clone(handler),
            wrapped: chain.is_some(),
            layout_chain: chain.unwrap_or_else(|| Arc::from(Vec::new())),
            metadata,
        });
    }
}

fn node_routes(
    tree: &NamespaceTree,
    chains: &mut ChainBuilder<'_>,
    id: NodeId,
    caps: &Capabilities,
) -> Result<Vec<RouteEntry>, ConfigurationError> {
    let mut out = NodeRoutes {
        tree,
        id,
        routes: Vec::new(),
    };

    if let Some(page) = &caps.page {
        let chain = chains.endpoint_chain(id)?;
        out.push(
            Method::Get,
            RouteKind::Page,
            "page",
            &[],
            page,
            Some(chain),
            caps.metadata.clone(),
        );
    }

    if let Some(submit) = &caps.submit_handler {
        let chain = chains.endpoint_chain(id)?;
        out.push(
            Method::Post,
            RouteKind::SubmitHandler,
            "page.submit",
            &[],
            submit,
            Some(chain),
            caps.metadata.clone(),
        );
    }

    for resolved in &caps.actions {
        let action = &resolved.action;
        let chain = if action.with_layout {
            Some(chains.endpoint_chain(id)?)
        } else {
            None
        };
        let metadata = action.metadata.clone().or_else(|| caps.metadata.clone());
        let suffix = format!("action.{}", default_action_path(&action.name));
        for method in &action.methods {
            out.push(
                *method,
                RouteKind::Action,
                &suffix,
                &resolved.segments,
                &action.handler,
                chain.clone(),
                metadata.clone(),
            );
        }
    }

    for resolved in &caps.apis {
        let route = &resolved.route;
        out.push(
            route.method,
            RouteKind::Api,
            &format!("api.{}", route.name),
            &resolved.segments,
            &route.handler,
            None,
            None,
        );
    }

    Ok(out.routes)
}

/// Discover every route in `namespace`.
///
/// Deterministic: the same namespace always yields the same routes in the
/// same order.
///
/// # Errors
///
/// Returns the first [`ConfigurationError`] found. Nothing is served from a
/// namespace that fails discovery.
pub fn discover(
    namespace: &dyn Namespace,
    options: RenderOptions,
) -> Result<RouteTable, ConfigurationError> {
    let tree = walk(namespace)?;
    let mut chains = ChainBuilder::new(&tree, namespace);
    let mut routes = Vec::new();
    let mut error_handlers = ErrorHandlers::new();

    for (id, node) in tree.iter() {
        // Every template is parsed up front, even on nodes without endpoints.
        chains.layout_at(id)?;

        let caps = capabilities(&tree, id)?;
        if let Some(handlers) = &caps.error_handlers {
            error_handlers.clone_from(handlers);
        }

        let found = node_routes(&tree, &mut chains, id, &caps)?;
        for route in &found {
            tracing::debug!(
                method = %route.method,
                pattern = %route.url_pattern,
                name = %route.name,
                layouts = route.layout_chain.len(),
                path = %node.path,
                "Registered route"
            );
        }
        routes.extend(found);
    }

    let table = RouteTable::new(routes, error_handlers, options)?;
    tracing::info!(
        nodes = tree.len(),
        routes = table.len(),
        templates = chains.template_count(),
        "Discovered routes"
    );
    Ok(table)
}
