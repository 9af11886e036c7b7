//! Conversion of rendered values and failures into HTTP responses.

use axum::Json;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use grove_namespace::{ErrorInfo, ErrorKey, RenderContext, RenderError, ResponseOverride, Value};
use grove_router::RouteTable;

/// Serve `value` with `status`. A response override keeps its own status.
pub(crate) fn value_response(value: Value, status: StatusCode) -> Response {
    match value {
        Value::Component(markup) => (status, Html(markup.into_string())).into_response(),
        Value::Data(data) => (status, Json(data)).into_response(),
        Value::Response(response) => override_response(response),
        Value::Slots(_) => {
            tracing::error!("Slot mapping reached the HTTP layer");
            generic_response(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

fn override_response(response: ResponseOverride) -> Response {
    let status =
        StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut http = (status, response.body).into_response();

    for (name, value) in response.headers {
        match (
            HeaderName::try_from(name.as_str()),
            HeaderValue::try_from(value.as_str()),
        ) {
            (Ok(name), Ok(value)) => {
                http.headers_mut().append(name, value);
            }
            _ => tracing::warn!(header = %name, "Dropping invalid response header"),
        }
    }

    http
}

/// Plain-text body with the status reason phrase.
pub(crate) fn generic_response(status: StatusCode) -> Response {
    let reason = status.canonical_reason().unwrap_or("Error");
    (status, format!("{} {reason}", status.as_u16())).into_response()
}

/// Route a failure with `status` through the first matching root error
/// handler, falling back to a generic response.
pub(crate) async fn error_response(
    table: &RouteTable,
    keys: &[ErrorKey],
    info: &ErrorInfo,
    cx: &mut RenderContext,
) -> Response {
    let status = StatusCode::from_u16(info.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let Some(handler) = keys.iter().find_map(|key| table.error_handler(*key)) else {
        return generic_response(status);
    };

    match handler.handle(info, cx).await {
        Ok(value) => value_response(value, status),
        Err(e) => {
            tracing::error!(status = info.status, error = %e, "Error handler failed");
            generic_response(status)
        }
    }
}

/// Respond to a failed render.
pub(crate) async fn render_error_response(
    table: &RouteTable,
    error: &RenderError,
    cx: &mut RenderContext,
) -> Response {
    let info = ErrorInfo {
        status: error.status(),
        message: error.to_string(),
    };
    error_response(
        table,
        &[ErrorKey::Render, ErrorKey::Status(info.status)],
        &info,
        cx,
    )
    .await
}

#[cfg(test)]
mod tests {
    use axum::http::header;
    use grove_namespace::Markup;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_component_response() {
        let response = value_response(Value::Component(Markup::raw("<p>x</p>")), StatusCode::OK);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/html; charset=utf-8"
        );
    }

    #[test]
    fn test_component_keeps_error_status() {
        let response = value_response(Value::component("gone"), StatusCode::NOT_FOUND);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_override_status_and_headers() {
        let response = value_response(
            Value::Response(
                ResponseOverride::redirect("/done")
                    .with_header("x-trace", "1")
                    .with_header("bad header", "dropped"),
            ),
            StatusCode::OK,
        );
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/done");
        assert_eq!(response.headers()["x-trace"], "1");
        assert!(response.headers().get("bad header").is_none());
    }

    #[test]
    fn test_data_is_json() {
        let response = value_response(Value::Data(serde_json::json!({"ok": true})), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    }

    #[test]
    fn test_invalid_override_status() {
        let response = value_response(
            Value::Response(ResponseOverride::new(42)),
            StatusCode::OK,
        );
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
