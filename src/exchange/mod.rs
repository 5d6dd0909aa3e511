//! Read-only view of one completed request/response cycle.
//!
//! The middleware snapshots the request before handing it downstream, then
//! pairs that snapshot with the finished response and the measured timing.
//! Extractors only ever see this view.

use std::{
    net::{IpAddr, SocketAddr},
    time::{Duration, Instant},
};

use axum::{
    body::HttpBody,
    extract::{ConnectInfo, OriginalUri, Request},
    http::{header, HeaderMap, Method, StatusCode, Uri, Version},
    response::Response,
};
use chrono::{DateTime, Utc};

/// Request attributes captured before the request moves downstream.
#[derive(Debug, Clone, Default)]
pub struct RequestSnapshot {
    pub method: Method,
    pub uri: Uri,
    pub version: Version,
    pub headers: HeaderMap,
    /// Client IP as normalized by the proxy rules (first `X-Forwarded-For`
    /// hop when the proxy is trusted).
    pub client_ip: Option<IpAddr>,
    /// Socket-level peer address, present when served with `ConnectInfo`.
    pub peer_addr: Option<SocketAddr>,
}

impl RequestSnapshot {
    pub fn capture(request: &Request, trust_proxy: bool) -> Self {
        let extensions = request.extensions();

        let peer_addr = extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        let uri = extensions
            .get::<OriginalUri>()
            .map(|OriginalUri(uri)| uri.clone())
            .unwrap_or_else(|| request.uri().clone());

        let client_ip = if trust_proxy {
            forwarded_client_ip(request.headers())
        } else {
            None
        };

        Self {
            method: request.method().clone(),
            uri,
            version: request.version(),
            headers: request.headers().clone(),
            client_ip,
            peer_addr,
        }
    }

    /// Best known client address: the normalized IP, else the socket peer.
    pub fn remote_ip(&self) -> Option<IpAddr> {
        self.client_ip.or_else(|| self.peer_addr.map(|addr| addr.ip()))
    }
}

fn forwarded_client_ip(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get("x-forwarded-for")?
        .to_str()
        .ok()?
        .split(',')
        .next()?
        .trim()
        .parse()
        .ok()
}

/// Per-request render state: how long the downstream chain took.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timing {
    elapsed: Duration,
}

impl Timing {
    pub fn since(start: Instant) -> Self {
        Self {
            elapsed: start.elapsed(),
        }
    }

    pub fn from_millis(millis: u64) -> Self {
        Self {
            elapsed: Duration::from_millis(millis),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn millis(&self) -> u128 {
        self.elapsed.as_millis()
    }
}

/// Everything a token extractor may read about one exchange.
#[derive(Debug, Clone)]
pub struct Exchange<'a> {
    pub request: &'a RequestSnapshot,
    pub status: StatusCode,
    pub response_headers: &'a HeaderMap,
    /// Response body size in bytes, when known.
    pub response_length: Option<u64>,
    pub timing: Timing,
    /// Instant used by `date` tokens.
    pub now: DateTime<Utc>,
}

impl<'a> Exchange<'a> {
    pub fn new(request: &'a RequestSnapshot, response: &'a Response, timing: Timing) -> Self {
        let response_length = response
            .body()
            .size_hint()
            .exact()
            .or_else(|| content_length(response.headers()));

        Self {
            request,
            status: response.status(),
            response_headers: response.headers(),
            response_length,
            timing,
            now: Utc::now(),
        }
    }
}

fn content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}
