// Fixed-status endpoints that exercise every branch of the access log.

use axum::{
    http::StatusCode,
    response::{AppendHeaders, IntoResponse, Json},
};
use serde_json::json;
use tracing::warn;

pub async fn ok() -> impl IntoResponse {
    (
        AppendHeaders([("x-keys", "foo"), ("x-keys", "bar")]),
        Json(json!({ "message": "hello" })),
    )
}

pub async fn moved_permanently() -> StatusCode {
    StatusCode::MOVED_PERMANENTLY
}

pub async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

pub async fn internal_error() -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
}

pub async fn failing() -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    warn!("Demo handler failing on purpose");
    Err((StatusCode::INTERNAL_SERVER_ERROR, "boom".to_string()))
}
