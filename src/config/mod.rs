use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::{exchange::Exchange, middleware::logging::SkipPredicate};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub access_log: AccessLogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: 9090,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    #[default]
    Stdout,
    Tracing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessLogConfig {
    /// Preset name or literal template.
    pub format: String,
    pub colored: bool,
    pub sink: SinkKind,
    pub absent_text: String,
    pub trust_proxy: bool,
    /// Skip requests whose status is below this value.
    pub skip_status_below: Option<u16>,
    /// Skip requests for these exact paths.
    pub skip_paths: Vec<String>,
}

impl Default for AccessLogConfig {
    fn default() -> Self {
        Self {
            format: "default".to_string(),
            colored: true,
            sink: SinkKind::Stdout,
            absent_text: "undefined".to_string(),
            trust_proxy: false,
            skip_status_below: None,
            skip_paths: Vec::new(),
        }
    }
}

impl AccessLogConfig {
    /// Skip predicate built from the configured rules, if any are set.
    pub fn skip_predicate(&self) -> Option<SkipPredicate> {
        if self.skip_status_below.is_none() && self.skip_paths.is_empty() {
            return None;
        }

        let status_below = self.skip_status_below;
        let paths = self.skip_paths.clone();

        Some(Arc::new(move |exchange: &Exchange<'_>| {
            let low_status = status_below.map_or(false, |min| exchange.status.as_u16() < min);
            let excluded_path = paths.iter().any(|path| exchange.request.uri.path() == path);
            low_status || excluded_path
        }))
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("CONFIG_PATH")
            .unwrap_or_else(|_| "config/default.yaml".to_string());

        let builder = config::Config::builder()
            .add_source(config::File::with_name(&config_path))
            .add_source(config::Environment::with_prefix("GATEWAY").separator("__"));

        Self::build(builder)
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        let builder = config::Config::builder()
            .add_source(config::File::from_str(contents, config::FileFormat::Yaml));

        Self::build(builder)
    }

    fn build(
        mut builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self> {
        // Override with environment variables if present
        if let Ok(host) = std::env::var("HOST") {
            builder = builder.set_override("server.host", host)?;
        }
        if let Ok(port) = std::env::var("PORT") {
            builder = builder.set_override("server.port", port.parse::<u16>()?)?;
        }
        if let Ok(metrics_port) = std::env::var("METRICS_PORT") {
            builder = builder.set_override("metrics.port", metrics_port.parse::<u16>()?)?;
        }
        if let Ok(format) = std::env::var("ACCESS_LOG_FORMAT") {
            builder = builder.set_override("access_log.format", format)?;
        }

        let settings = builder.build()?;
        let config: AppConfig = settings.try_deserialize()?;
        Ok(config)
    }
}
