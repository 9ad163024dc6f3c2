//! Shared HTTP response formatter.
//!
//! Every handler funnels through this module; no handler builds its own
//! success or error shape. Validation failures map to 404, matching the
//! deployed API's observed contract.

use lambda_http::{http::StatusCode, Body, Response};
use serde::Serialize;
use serde_json::json;
use tracing::{error, warn};

use crate::error::AppError;

/// 200 with the result wrapped in a `data` envelope.
pub fn data<T: Serialize>(value: T) -> Response<Body> {
    let value = serde_json::to_value(value).unwrap_or_else(|_| json!([]));
    json_response(StatusCode::OK, json!({ "data": value }))
}

/// 404 for key-qualified reads that matched nothing.
pub fn no_reviews(detail: &str) -> Response<Body> {
    json_response(StatusCode::NOT_FOUND, json!({ "Message": detail }))
}

/// 401 for requests the session authorizer denied.
pub fn unauthorized() -> Response<Body> {
    json_response(
        StatusCode::UNAUTHORIZED,
        json!({ "Message": "Unauthorized" }),
    )
}

/// 404 for paths outside the routing table.
pub fn unsupported_route() -> Response<Body> {
    json_response(
        StatusCode::NOT_FOUND,
        json!({ "Message": "Unsupported route" }),
    )
}

/// Terminal response for a failed pipeline stage.
pub fn from_error(err: &AppError) -> Response<Body> {
    match err {
        AppError::Validation(message) | AppError::NotFound(message) => {
            json_response(StatusCode::NOT_FOUND, json!({ "Message": message }))
        }
        AppError::Auth(_) => unauthorized(),
        AppError::Store(detail) | AppError::Internal(detail) => json_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": detail }),
        ),
    }
}

/// Serialize a value into an HTTP JSON response.
pub fn json_response<T: Serialize>(status: StatusCode, value: T) -> Response<Body> {
    let body = serde_json::to_string(&value).unwrap_or_else(|_| "{}".into());

    if status.is_server_error() {
        error!(
            http_status = status.as_u16(),
            body = %body,
            "returning server error response"
        );
    } else if status.is_client_error() {
        warn!(
            http_status = status.as_u16(),
            body = %body,
            "returning client error response"
        );
    }

    Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(Body::Text(body))
        .expect("failed to build response")
}
