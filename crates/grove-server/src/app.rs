//! Router construction.
//!
//! Registers one method router per discovered URL pattern, with a fallback
//! that sends unmatched paths through the root 404 handler.

use std::collections::HashMap;
use std::sync::Arc;

use axum::Router;
use axum::extract::rejection::RawPathParamsRejection;
use axum::extract::{RawPathParams, Request, State};
use axum::routing::{MethodFilter, MethodRouter};
use grove_namespace::Method;
use grove_router::RouteTable;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::{AppState, DEFAULT_BODY_LIMIT};

fn method_filter(method: Method) -> MethodFilter {
    match method {
        Method::Get => MethodFilter::GET,
        Method::Post => MethodFilter::POST,
        Method::Put => MethodFilter::PUT,
        Method::Patch => MethodFilter::PATCH,
        Method::Delete => MethodFilter::DELETE,
    }
}

/// Route indices grouped by URL pattern, in first-seen order.
fn group_by_pattern(table: &RouteTable) -> Vec<(String, Vec<usize>)> {
    let mut groups: Vec<(String, Vec<usize>)> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for (index, route) in table.routes().iter().enumerate() {
        if let Some(&position) = positions.get(route.url_pattern.as_str()) {
            groups[position].1.push(index);
        } else {
            positions.insert(&route.url_pattern, groups.len());
            groups.push((route.url_pattern.clone(), vec![index]));
        }
    }

    groups
}

/// Create the application router for `table`.
pub fn create_router(table: Arc<RouteTable>) -> Router {
    router_with_state(Arc::new(AppState {
        table,
        body_limit: DEFAULT_BODY_LIMIT,
    }))
}

pub(crate) fn router_with_state(state: Arc<AppState>) -> Router {
    let mut router: Router<Arc<AppState>> = Router::new();

    for (pattern, indices) in group_by_pattern(&state.table) {
        let mut method_router: MethodRouter<Arc<AppState>> = MethodRouter::new();
        for index in indices {
            let filter = method_filter(state.table.routes()[index].method);
            method_router = method_router.on(
                filter,
                move |State(state): State<Arc<AppState>>,
                      params: Result<RawPathParams, RawPathParamsRejection>,
                      request: Request| {
                    handlers::dispatch(state, index, params, request)
                },
            );
        }
        router = router.route(&pattern, method_router);
    }

    router
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
