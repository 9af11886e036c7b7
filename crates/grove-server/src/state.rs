//! Application state.
//!
//! Shared state for all request handlers.

use std::sync::Arc;

use grove_router::RouteTable;

/// Maximum accepted request body size.
pub(crate) const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Application state shared across all handlers.
pub(crate) struct AppState {
    /// Discovered routes, immutable for the server's lifetime.
    pub(crate) table: Arc<RouteTable>,
    /// Request bodies beyond this size are rejected.
    pub(crate) body_limit: usize,
}
