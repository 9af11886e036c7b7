//! Request handlers.
//!
//! Every discovered route is served by [`dispatch`]; unmatched paths end up
//! in [`not_found`].

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::rejection::RawPathParamsRejection;
use axum::extract::{RawPathParams, Request, State};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::Response;
use grove_namespace::{ErrorInfo, ErrorKey, Method, RenderContext, RenderError, RequestInfo};

use crate::response::{error_response, render_error_response, value_response};
use crate::state::AppState;

/// Copy method, path, query and headers out of the request head.
fn request_head(method: Method, parts: &Parts) -> Result<RequestInfo, RenderError> {
    let mut info = RequestInfo::new(method, parts.uri.path());

    if let Some(query) = parts.uri.query() {
        let pairs: BTreeMap<String, String> = serde_urlencoded::from_str(query)
            .map_err(|e| RenderError::BadRequest(format!("invalid query string: {e}")))?;
        info.query = pairs;
    }

    for (name, value) in &parts.headers {
        if let Ok(value) = value.to_str() {
            info = info.with_header(name.as_str(), value);
        }
    }

    Ok(info)
}

async fn read_body(body: Body, limit: usize) -> Result<Vec<u8>, RenderError> {
    let bytes = axum::body::to_bytes(body, limit)
        .await
        .map_err(|e| RenderError::BadRequest(format!("unreadable request body: {e}")))?;
    Ok(bytes.to_vec())
}

/// Build the per-request context for a matched route.
async fn build_context(
    method: Method,
    params: &RawPathParams,
    request: Request,
    body_limit: usize,
) -> Result<RenderContext, (RenderContext, RenderError)> {
    let (parts, body) = request.into_parts();
    let bare = || RenderContext::new(RequestInfo::new(method, parts.uri.path()));

    let mut info = request_head(method, &parts).map_err(|e| (bare(), e))?;
    for (name, value) in params.iter() {
        info = info.with_param(name, value);
    }
    info.body = read_body(body, body_limit).await.map_err(|e| (bare(), e))?;

    Ok(RenderContext::new(info))
}

/// Serve the route at `index` of the route table.
pub(crate) async fn dispatch(
    state: Arc<AppState>,
    index: usize,
    params: Result<RawPathParams, RawPathParamsRejection>,
    request: Request,
) -> Response {
    let route = &state.table.routes()[index];

    let params = match params {
        Ok(params) => params,
        Err(rejection) => {
            let mut cx = RenderContext::new(RequestInfo::new(route.method, request.uri().path()));
            let error = RenderError::BadRequest(format!("invalid path parameter: {rejection}"));
            tracing::warn!(route = %route.name, error = %error, "Rejected request");
            return render_error_response(&state.table, &error, &mut cx).await;
        }
    };

    let mut cx = match build_context(route.method, &params, request, state.body_limit).await {
        Ok(cx) => cx,
        Err((mut cx, error)) => {
            tracing::warn!(route = %route.name, error = %error, "Rejected request");
            return render_error_response(&state.table, &error, &mut cx).await;
        }
    };

    match state.table.render(route, &mut cx).await {
        Ok(value) => value_response(value, StatusCode::OK),
        Err(error) => {
            tracing::error!(
                route = %route.name,
                path = %cx.request.path,
                error = %error,
                "Render failed"
            );
            render_error_response(&state.table, &error, &mut cx).await
        }
    }
}

/// Fallback for paths no route matches.
pub(crate) async fn not_found(State(state): State<Arc<AppState>>, request: Request) -> Response {
    let (parts, _) = request.into_parts();
    let method = parts.method.as_str().parse().unwrap_or(Method::Get);
    let info = request_head(method, &parts)
        .unwrap_or_else(|_| RequestInfo::new(method, parts.uri.path()));
    let mut cx = RenderContext::new(info);

    tracing::debug!(path = %cx.request.path, "No route matched");

    let status = StatusCode::NOT_FOUND;
    let error = ErrorInfo {
        status: status.as_u16(),
        message: format!("no route for {}", parts.uri.path()),
    };
    error_response(&state.table, &[ErrorKey::Status(error.status)], &error, &mut cx).await
}
