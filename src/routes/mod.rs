use std::time::Duration;

use axum::{middleware::from_fn_with_state, routing::get, Router};
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;

use crate::{
    middleware::logging::{access_log, AccessLogger},
    AppState,
};

pub mod demo;
pub mod health;

/// Demo gateway routes wrapped in the access log middleware.
pub fn create_router(state: AppState, logger: AccessLogger) -> Router {
    let timeout = Duration::from_secs(state.config.server.timeout_seconds);

    Router::new()
        .route("/health", get(health::health))
        .route("/200", get(demo::ok))
        .route("/301", get(demo::moved_permanently))
        .route("/404", get(demo::not_found))
        .route("/500", get(demo::internal_error))
        .route("/error", get(demo::failing))
        .layer(
            ServiceBuilder::new()
                .layer(from_fn_with_state(logger, access_log))
                .layer(TimeoutLayer::new(timeout)),
        )
        .with_state(state)
}
