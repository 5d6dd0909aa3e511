use std::{fmt, sync::Arc, time::Instant};

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::{error, info};

use crate::{
    config::{AccessLogConfig, SinkKind},
    error::RenderError,
    exchange::{Exchange, RequestSnapshot, Timing},
    format::{RenderSettings, Template},
    tokens::TokenRegistry,
};

pub type SkipPredicate = Arc<dyn Fn(&Exchange<'_>) -> bool + Send + Sync>;

/// Destination of rendered access log lines.
#[derive(Clone)]
pub struct LogSink(Arc<dyn Fn(&str) + Send + Sync>);

impl LogSink {
    /// Print each line to standard output.
    pub fn stdout() -> Self {
        Self::from_fn(|line| println!("{line}"))
    }

    /// Emit each line as an `info` event on the `access_log` target.
    pub fn tracing() -> Self {
        Self::from_fn(|line| info!(target: "access_log", "{}", line))
    }

    pub fn from_fn<F>(write: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        Self(Arc::new(write))
    }

    pub fn write(&self, line: &str) {
        (self.0)(line)
    }
}

impl fmt::Debug for LogSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LogSink")
    }
}

#[derive(Clone)]
pub struct AccessLogOptions {
    pub sink: LogSink,
    /// Color the `:status` token by status class.
    pub colored: bool,
    /// Requests for which this returns true are not logged.
    pub skip: Option<SkipPredicate>,
    /// Text rendered for tokens with no value.
    pub absent_text: String,
    /// Take the client IP from `X-Forwarded-For`.
    pub trust_proxy: bool,
}

impl Default for AccessLogOptions {
    fn default() -> Self {
        Self {
            sink: LogSink::stdout(),
            colored: true,
            skip: None,
            absent_text: "undefined".to_string(),
            trust_proxy: false,
        }
    }
}

impl AccessLogOptions {
    pub fn sink(mut self, sink: LogSink) -> Self {
        self.sink = sink;
        self
    }

    pub fn colored(mut self, colored: bool) -> Self {
        self.colored = colored;
        self
    }

    pub fn skip<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Exchange<'_>) -> bool + Send + Sync + 'static,
    {
        self.skip = Some(Arc::new(predicate));
        self
    }

    pub fn absent_text(mut self, text: impl Into<String>) -> Self {
        self.absent_text = text.into();
        self
    }

    pub fn trust_proxy(mut self, trust: bool) -> Self {
        self.trust_proxy = trust;
        self
    }
}

impl fmt::Debug for AccessLogOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessLogOptions")
            .field("colored", &self.colored)
            .field("skip", &self.skip.is_some())
            .field("absent_text", &self.absent_text)
            .field("trust_proxy", &self.trust_proxy)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutcome {
    Written,
    Skipped,
}

/// Renders one line per exchange and hands it to the configured sink.
#[derive(Debug, Clone)]
pub struct AccessLogger {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    template: Template,
    options: AccessLogOptions,
}

impl AccessLogger {
    /// `format` is a preset name (`combined`, `common`, `default`, `dev`,
    /// `short`, `tiny`) or a literal template.
    pub fn new(format: &str, options: AccessLogOptions) -> Self {
        Self {
            inner: Arc::new(Inner {
                template: Template::resolve(format),
                options,
            }),
        }
    }

    /// Build from configuration, rejecting templates with unknown tokens.
    pub fn from_config(config: &AccessLogConfig) -> Result<Self, RenderError> {
        let sink = match config.sink {
            SinkKind::Stdout => LogSink::stdout(),
            SinkKind::Tracing => LogSink::tracing(),
        };

        let mut options = AccessLogOptions::default()
            .sink(sink)
            .colored(config.colored)
            .absent_text(config.absent_text.clone())
            .trust_proxy(config.trust_proxy);
        options.skip = config.skip_predicate();

        let logger = Self::new(&config.format, options);
        logger.template().validate(TokenRegistry::global())?;
        Ok(logger)
    }

    pub fn template(&self) -> &Template {
        &self.inner.template
    }

    pub fn options(&self) -> &AccessLogOptions {
        &self.inner.options
    }

    pub fn render(&self, exchange: &Exchange<'_>) -> Result<String, RenderError> {
        let options = &self.inner.options;
        let settings = RenderSettings {
            colored: options.colored,
            absent_text: &options.absent_text,
        };

        self.inner
            .template
            .render(TokenRegistry::global(), exchange, &settings)
    }

    /// Apply the skip predicate, then render and write exactly one line.
    pub fn log(&self, exchange: &Exchange<'_>) -> Result<LogOutcome, RenderError> {
        if let Some(skip) = &self.inner.options.skip {
            if skip(exchange) {
                crate::metrics::record_skipped();
                return Ok(LogOutcome::Skipped);
            }
        }

        let line = self.render(exchange)?;
        self.inner.options.sink.write(&line);
        crate::metrics::record_line_written(exchange.status.as_u16(), exchange.timing.elapsed());

        Ok(LogOutcome::Written)
    }
}

impl Default for AccessLogger {
    fn default() -> Self {
        Self::new("default", AccessLogOptions::default())
    }
}

/// Access log middleware, mounted with `axum::middleware::from_fn_with_state`.
///
/// A render failure is reported and counted but never changes the response.
pub async fn access_log(
    State(logger): State<AccessLogger>,
    request: Request,
    next: Next,
) -> Response {
    let start_time = Instant::now();
    let snapshot = RequestSnapshot::capture(&request, logger.options().trust_proxy);

    let response = next.run(request).await;
    let timing = Timing::since(start_time);

    let exchange = Exchange::new(&snapshot, &response, timing);
    if let Err(e) = logger.log(&exchange) {
        crate::metrics::record_render_failure();
        error!(
            error = %e,
            format = logger.template().as_str(),
            path = snapshot.uri.path(),
            "Failed to render access log line"
        );
    }

    response
}
