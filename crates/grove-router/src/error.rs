//! Discovery-time and lookup errors.

use grove_namespace::{Method, NamespaceError};

use crate::segment::SegmentError;
use crate::template::TemplateError;

/// A namespace that can't be turned into a route table.
///
/// Always fatal: discovery stops at the first one.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("invalid segment '{name}' under '{parent}': {source}")]
    InvalidSegment {
        parent: String,
        name: String,
        #[source]
        source: SegmentError,
    },

    #[error("siblings '{first}' and '{second}' under '{parent}' both map to '{normalized}'")]
    SiblingCollision {
        parent: String,
        first: String,
        second: String,
        normalized: String,
    },

    #[error("ambiguous parameters '{first}' and '{second}' under '{parent}'")]
    AmbiguousParams {
        parent: String,
        first: String,
        second: String,
    },

    #[error("invalid path '{path}' for {what} at '{node}': {source}")]
    InvalidEndpointPath {
        node: String,
        what: String,
        path: String,
        #[source]
        source: SegmentError,
    },

    #[error("actions '{first}' and '{second}' at '{node}' both answer {method} {pattern}")]
    ActionCollision {
        node: String,
        first: String,
        second: String,
        method: Method,
        pattern: String,
    },

    #[error("{method} {pattern} registered twice ('{first}' and '{second}')")]
    DuplicateRoute {
        method: Method,
        pattern: String,
        first: String,
        second: String,
    },

    #[error("patterns '{first}' and '{second}' differ only in parameter names")]
    ConflictingPatterns { first: String, second: String },

    #[error("route name '{name}' used for both '{first}' and '{second}'")]
    DuplicateName {
        name: String,
        first: String,
        second: String,
    },

    #[error("template layout at '{node}': {source}")]
    Template {
        node: String,
        #[source]
        source: TemplateError,
    },

    #[error("layout chain revisits node '{node}'")]
    LayoutCycle { node: String },

    #[error(transparent)]
    Namespace(#[from] NamespaceError),
}

/// Reverse URL lookup failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UrlError {
    #[error("no route named '{0}'")]
    UnknownRoute(String),
    #[error("route '{route}' requires parameter '{param}'")]
    MissingParameter { route: String, param: String },
}
