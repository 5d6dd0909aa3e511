use std::sync::Arc;

pub mod config;
pub mod error;
pub mod exchange;
pub mod format;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod tokens;

pub use error::RenderError;
pub use exchange::{Exchange, RequestSnapshot, Timing};
pub use format::{Preset, Template};
pub use middleware::logging::{access_log, AccessLogOptions, AccessLogger, LogOutcome, LogSink};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::AppConfig>,
}
