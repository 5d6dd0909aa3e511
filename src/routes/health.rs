use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: String,
    pub access_log: AccessLogInfo,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccessLogInfo {
    pub format: String,
    pub colored: bool,
}

/// Basic health check endpoint
///
/// Also reports which access log format the gateway was started with.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    info!("Health check requested");

    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "gateway-access-log".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        access_log: AccessLogInfo {
            format: state.config.access_log.format.clone(),
            colored: state.config.access_log.colored,
        },
    })
}
