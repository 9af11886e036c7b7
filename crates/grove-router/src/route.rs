//! Route table.
//!
//! The immutable output of discovery: one [`RouteEntry`] per
//! (node, endpoint, method), plus the root error handlers and the render
//! options shared by every request.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use grove_namespace::{
    ErrorHandler, ErrorHandlers, ErrorKey, Handler, MetadataSource, Method, RenderContext,
    RenderError, SlotMap, Value,
};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::chain::LayoutChain;
use crate::error::{ConfigurationError, UrlError};
use crate::render::render_route;
use crate::segment::SegmentDescriptor;
use crate::template::MissingMetadata;
use crate::tree::NodeId;

/// RFC 3986 unreserved characters stay as-is.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Which marker produced a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    Page,
    SubmitHandler,
    Action,
    Api,
}

impl fmt::Display for RouteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Page => "page",
            Self::SubmitHandler => "submit",
            Self::Action => "action",
            Self::Api => "api",
        };
        f.write_str(name)
    }
}

/// A single registered endpoint.
#[derive(Clone)]
pub struct RouteEntry {
    pub method: Method,
    /// Axum-style pattern, e.g. `"/users/{user_id}"`.
    pub url_pattern: String,
    /// Stable name for reverse lookup, e.g. `"users.{user_id}.page"`.
    pub name: String,
    pub kind: RouteKind,
    pub node: NodeId,
    /// Namespace path of the node the endpoint is attached to.
    pub node_path: String,
    pub segments: Vec<SegmentDescriptor>,
    pub handler: Arc<dyn Handler>,
    /// Layouts to apply, outermost first. Empty for bare routes.
    pub layout_chain: LayoutChain,
    pub metadata: Option<MetadataSource>,
    /// Whether the output goes through `layout_chain`.
    pub wrapped: bool,
}

impl fmt::Debug for RouteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteEntry")
            .field("method", &self.method)
            .field("url_pattern", &self.url_pattern)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("node_path", &self.node_path)
            .field("layout_chain", &self.layout_chain)
            .field("metadata", &self.metadata)
            .field("wrapped", &self.wrapped)
            .finish_non_exhaustive()
    }
}

/// Application-wide rendering settings.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Fallback content for template slots with no explicit value.
    pub default_slots: SlotMap,
    pub missing_metadata: MissingMetadata,
}

/// Routes discovered from a namespace.
pub struct RouteTable {
    routes: Vec<RouteEntry>,
    name_index: HashMap<String, usize>,
    error_handlers: ErrorHandlers,
    options: RenderOptions,
}

/// Pattern with parameter names erased, used to catch patterns the HTTP
/// router can't tell apart.
fn pattern_shape(segments: &[SegmentDescriptor]) -> Vec<&str> {
    segments
        .iter()
        .map(|segment| match segment {
            SegmentDescriptor::Literal(text) => text.as_str(),
            SegmentDescriptor::Param(_) => "{}",
        })
        .collect()
}

/// Check `routes` for clashes and index them by name.
fn index_routes(routes: &[RouteEntry]) -> Result<HashMap<String, usize>, ConfigurationError> {
    let mut registered: HashMap<(Method, &str), &RouteEntry> = HashMap::new();
    let mut shapes: HashMap<Vec<&str>, &RouteEntry> = HashMap::new();
    let mut name_index: HashMap<String, usize> = HashMap::new();

    for (index, route) in routes.iter().enumerate() {
        if let Some(first) = registered.insert((route.method, route.url_pattern.as_str()), route) {
            return Err(ConfigurationError::DuplicateRoute {
                method: route.method,
                pattern: route.url_pattern.clone(),
                first: first.name.clone(),
                second: route.name.clone(),
            });
        }

        if let Some(first) = shapes.insert(pattern_shape(&route.segments), route)
            && first.url_pattern != route.url_pattern
        {
            return Err(ConfigurationError::ConflictingPatterns {
                first: first.url_pattern.clone(),
                second: route.url_pattern.clone(),
            });
        }

        match name_index.get(&route.name) {
            Some(&existing) if routes[existing].url_pattern != route.url_pattern => {
                return Err(ConfigurationError::DuplicateName {
                    name: route.name.clone(),
                    first: routes[existing].url_pattern.clone(),
                    second: route.url_pattern.clone(),
                });
            }
            Some(_) => {}
            None => {
                name_index.insert(route.name.clone(), index);
            }
        }
    }

    Ok(name_index)
}

impl RouteTable {
    /// Validate and index `routes`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] when two routes share method and
    /// pattern, when patterns differ only in parameter names, or when one
    /// name is used for different patterns.
    pub fn new(
        routes: Vec<RouteEntry>,
        error_handlers: ErrorHandlers,
        options: RenderOptions,
    ) -> Result<Self, ConfigurationError> {
        let name_index = index_routes(&routes)?;
        Ok(Self {
            routes,
            name_index,
            error_handlers,
            options,
        })
    }

    /// All routes in discovery order.
    #[must_use]
    pub fn routes(&self) -> &[RouteEntry] {
        &self.routes
    }

    /// First route registered under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&RouteEntry> {
        self.name_index.get(name).map(|&index| &self.routes[index])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    #[must_use]
    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Root error handler registered for `key`.
    #[must_use]
    pub fn error_handler(&self, key: ErrorKey) -> Option<&Arc<dyn ErrorHandler>> {
        self.error_handlers.get(&key)
    }

    /// Build a concrete URL for the route named `name`.
    ///
    /// Parameter values are percent-encoded; extra parameters are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`UrlError`] for unknown names and missing parameters.
    pub fn url_for(&self, name: &str, params: &[(&str, &str)]) -> Result<String, UrlError> {
        let route = self
            .get(name)
            .ok_or_else(|| UrlError::UnknownRoute(name.to_owned()))?;

        if route.segments.is_empty() {
            return Ok("/".to_owned());
        }

        let mut url = String::new();
        for segment in &route.segments {
            url.push('/');
            match segment {
                SegmentDescriptor::Literal(text) => url.push_str(text),
                SegmentDescriptor::Param(param) => {
                    let value = params
                        .iter()
                        .find_map(|&(key, value)| (key == param.as_str()).then_some(value))
                        .ok_or_else(|| UrlError::MissingParameter {
                            route: name.to_owned(),
                            param: param.clone(),
                        })?;
                    url.extend(utf8_percent_encode(value, PATH_SEGMENT));
                }
            }
        }
        Ok(url)
    }

    /// Run `route` for one request.
    pub async fn render(
        &self,
        route: &RouteEntry,
        cx: &mut RenderContext,
    ) -> Result<Value, RenderError> {
        render_route(route, &self.options, cx).await
    }
}

impl fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteTable")
            .field("routes", &self.routes)
            .field("error_handlers", &self.error_handlers.keys().collect::<Vec<_>>())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use grove_namespace::{Markup, handler_fn};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::segment::{parse_relative_path, url_pattern};

    fn entry(method: Method, pattern: &str, name: &str) -> RouteEntry {
        let segments = parse_relative_path(pattern).unwrap();
        RouteEntry {
            method,
            url_pattern: url_pattern(&segments),
            name: name.to_owned(),
            kind: RouteKind::Page,
            node: 0,
            node_path: String::new(),
            segments,
            handler: handler_fn(|_| Ok(Markup::raw("ok").into())),
            layout_chain: Arc::from(Vec::new()),
            metadata: None,
            wrapped: true,
        }
    }

    fn table(routes: Vec<RouteEntry>) -> Result<RouteTable, ConfigurationError> {
        RouteTable::new(routes, ErrorHandlers::new(), RenderOptions::default())
    }

    #[test]
    fn test_url_for_encodes_params() {
        let table = table(vec![
            entry(Method::Get, "/", "page"),
            entry(Method::Get, "/users/{user_id}", "users.{user_id}.page"),
        ])
        .unwrap();

        assert_eq!(table.url_for("page", &[]).unwrap(), "/");
        assert_eq!(
            table
                .url_for("users.{user_id}.page", &[("user_id", "a b/c")])
                .unwrap(),
            "/users/a%20b%2Fc"
        );
        assert_eq!(
            table
                .url_for("users.{user_id}.page", &[("user_id", "x-1_y.z~")])
                .unwrap(),
            "/users/x-1_y.z~"
        );
    }

    #[test]
    fn test_url_for_errors() {
        let table = table(vec![entry(Method::Get, "/users/{user_id}", "user")]).unwrap();
        assert_eq!(
            table.url_for("missing", &[]),
            Err(UrlError::UnknownRoute("missing".to_owned()))
        );
        assert_eq!(
            table.url_for("user", &[("id", "1")]),
            Err(UrlError::MissingParameter {
                route: "user".to_owned(),
                param: "user_id".to_owned(),
            })
        );
    }

    #[test]
    fn test_duplicate_method_and_pattern() {
        let err = table(vec![
            entry(Method::Get, "/a", "one"),
            entry(Method::Get, "/a", "two"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigurationError::DuplicateRoute { .. }));
    }

    #[test]
    fn test_same_pattern_other_method_allowed() {
        let table = table(vec![
            entry(Method::Get, "/a", "a.page"),
            entry(Method::Post, "/a", "a.page.submit"),
        ])
        .unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("a.page.submit").unwrap().method, Method::Post);
    }

    #[test]
    fn test_patterns_differing_in_param_names() {
        let err = table(vec![
            entry(Method::Get, "/u/{id}", "one"),
            entry(Method::Post, "/u/{slug}", "two"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigurationError::ConflictingPatterns { .. }));
    }

    #[test]
    fn test_duplicate_name_different_pattern() {
        let err = table(vec![
            entry(Method::Get, "/a", "same"),
            entry(Method::Get, "/b", "same"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigurationError::DuplicateName { .. }));
    }

    #[test]
    fn test_shared_name_same_pattern_allowed() {
        let table = table(vec![
            entry(Method::Get, "/todo/clear", "todo.action.clear"),
            entry(Method::Post, "/todo/clear", "todo.action.clear"),
        ])
        .unwrap();
        assert_eq!(table.get("todo.action.clear").unwrap().method, Method::Get);
    }
}
