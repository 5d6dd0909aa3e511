//! Token registry
//!
//! Maps every `:token` name a template may use to the extractor that reads
//! its value from an [`Exchange`]. The registry is built once on first use
//! and never changes afterwards.

use std::collections::HashMap;

use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Version};
use once_cell::sync::Lazy;

use crate::{exchange::Exchange, middleware::auth};

mod date;

/// Value produced by an extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenValue {
    Text(String),
    /// The exchange carries no data for this token.
    Absent,
}

impl TokenValue {
    /// Text to substitute, using `absent` when there is no value.
    pub fn as_text<'a>(&'a self, absent: &'a str) -> &'a str {
        match self {
            TokenValue::Text(text) => text,
            TokenValue::Absent => absent,
        }
    }
}

impl From<String> for TokenValue {
    fn from(text: String) -> Self {
        TokenValue::Text(text)
    }
}

impl From<&str> for TokenValue {
    fn from(text: &str) -> Self {
        TokenValue::Text(text.to_owned())
    }
}

impl From<Option<String>> for TokenValue {
    fn from(text: Option<String>) -> Self {
        text.map_or(TokenValue::Absent, TokenValue::Text)
    }
}

/// What the template passed alongside a token reference.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenInput<'a> {
    /// Bracketed argument, e.g. `clf` in `:date[clf]`.
    pub arg: Option<&'a str>,
    /// Only ever set by the renderer, and only for `:status`.
    pub(crate) colored: bool,
}

impl<'a> TokenInput<'a> {
    pub fn new(arg: Option<&'a str>) -> Self {
        Self {
            arg,
            colored: false,
        }
    }
}

pub type Extractor = fn(&Exchange<'_>, &TokenInput<'_>) -> TokenValue;

pub struct TokenRegistry {
    extractors: HashMap<&'static str, Extractor>,
}

static REGISTRY: Lazy<TokenRegistry> = Lazy::new(TokenRegistry::builtin);

impl TokenRegistry {
    pub fn global() -> &'static TokenRegistry {
        &REGISTRY
    }

    fn builtin() -> Self {
        let entries: [(&'static str, Extractor); 12] = [
            ("date", date_token),
            ("http-version", http_version),
            ("method", method),
            ("referrer", referrer),
            ("remote-addr", remote_addr),
            ("remote-user", remote_user),
            ("req", request_header),
            ("res", response_header),
            ("response-time", response_time),
            ("status", status),
            ("url", url),
            ("user-agent", user_agent),
        ];

        Self {
            extractors: entries.into_iter().collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<Extractor> {
        self.extractors.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.extractors.contains_key(name)
    }

    /// Registered token names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.extractors.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

/// Wrap a status code in the ANSI color for its class.
pub fn colored_status(status: u16) -> String {
    let color = match status {
        500..=u16::MAX => 31, // red
        400..=499 => 33,      // yellow
        300..=399 => 36,      // cyan
        200..=299 => 32,      // green
        _ => 0,
    };

    format!("\x1b[{color}m{status}\x1b[0m")
}

fn date_token(exchange: &Exchange<'_>, input: &TokenInput<'_>) -> TokenValue {
    match input.arg.unwrap_or("web") {
        "clf" => date::clf(&exchange.now).into(),
        "iso" => date::iso(&exchange.now).into(),
        "web" => date::web(&exchange.now).into(),
        _ => TokenValue::Absent,
    }
}

fn http_version(exchange: &Exchange<'_>, _: &TokenInput<'_>) -> TokenValue {
    const VERSIONS: [(Version, &str); 5] = [
        (Version::HTTP_09, "0.9"),
        (Version::HTTP_10, "1.0"),
        (Version::HTTP_11, "1.1"),
        (Version::HTTP_2, "2.0"),
        (Version::HTTP_3, "3.0"),
    ];

    VERSIONS
        .iter()
        .find(|(version, _)| *version == exchange.request.version)
        .map_or(TokenValue::Absent, |(_, text)| (*text).into())
}

fn method(exchange: &Exchange<'_>, _: &TokenInput<'_>) -> TokenValue {
    exchange.request.method.as_str().into()
}

fn referrer(exchange: &Exchange<'_>, _: &TokenInput<'_>) -> TokenValue {
    let headers = &exchange.request.headers;
    headers
        .get(header::REFERER)
        .or_else(|| headers.get("referrer"))
        .map(header_text)
        .into()
}

fn remote_addr(exchange: &Exchange<'_>, _: &TokenInput<'_>) -> TokenValue {
    exchange.request.remote_ip().map(|ip| ip.to_string()).into()
}

fn remote_user(exchange: &Exchange<'_>, _: &TokenInput<'_>) -> TokenValue {
    auth::parse(&exchange.request.headers)
        .map(|credentials| credentials.name)
        .into()
}

fn request_header(exchange: &Exchange<'_>, input: &TokenInput<'_>) -> TokenValue {
    joined_header(&exchange.request.headers, input.arg)
}

fn response_header(exchange: &Exchange<'_>, input: &TokenInput<'_>) -> TokenValue {
    match input.arg {
        Some(name) if name.eq_ignore_ascii_case("content-length") => {
            exchange.response_length.unwrap_or(0).to_string().into()
        }
        name => joined_header(exchange.response_headers, name),
    }
}

fn response_time(exchange: &Exchange<'_>, _: &TokenInput<'_>) -> TokenValue {
    exchange.timing.millis().to_string().into()
}

fn status(exchange: &Exchange<'_>, input: &TokenInput<'_>) -> TokenValue {
    let code = exchange.status.as_u16();
    if input.colored {
        colored_status(code).into()
    } else {
        code.to_string().into()
    }
}

fn url(exchange: &Exchange<'_>, _: &TokenInput<'_>) -> TokenValue {
    let uri = &exchange.request.uri;
    uri.path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path())
        .into()
}

fn user_agent(exchange: &Exchange<'_>, _: &TokenInput<'_>) -> TokenValue {
    exchange
        .request
        .headers
        .get(header::USER_AGENT)
        .map(header_text)
        .into()
}

/// All values of a header joined with `", "`, or `-` when there are none.
fn joined_header(headers: &HeaderMap, name: Option<&str>) -> TokenValue {
    let Some(name) = name.and_then(|name| HeaderName::try_from(name).ok()) else {
        return "-".into();
    };

    let values: Vec<String> = headers.get_all(&name).iter().map(header_text).collect();
    if values.is_empty() {
        "-".into()
    } else {
        values.join(", ").into()
    }
}

fn header_text(value: &HeaderValue) -> String {
    String::from_utf8_lossy(value.as_bytes()).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::{fixtures, RequestSnapshot};
    use axum::http::StatusCode;

    fn extract(exchange: &Exchange<'_>, name: &str, arg: Option<&str>) -> TokenValue {
        let extractor = TokenRegistry::global().get(name).unwrap();
        extractor(exchange, &TokenInput::new(arg))
    }

    #[test]
    fn test_registry_names() {
        assert_eq!(
            TokenRegistry::global().names(),
            vec![
                "date",
                "http-version",
                "method",
                "referrer",
                "remote-addr",
                "remote-user",
                "req",
                "res",
                "response-time",
                "status",
                "url",
                "user-agent",
            ]
        );
        assert!(!TokenRegistry::global().contains("nope"));
    }

    #[test]
    fn test_status_color_boundaries() {
        let cases = [
            (199, "\x1b[0m199\x1b[0m"),
            (200, "\x1b[32m200\x1b[0m"),
            (299, "\x1b[32m299\x1b[0m"),
            (300, "\x1b[36m300\x1b[0m"),
            (399, "\x1b[36m399\x1b[0m"),
            (400, "\x1b[33m400\x1b[0m"),
            (499, "\x1b[33m499\x1b[0m"),
            (500, "\x1b[31m500\x1b[0m"),
            (599, "\x1b[31m599\x1b[0m"),
        ];

        for (code, expected) in cases {
            assert_eq!(colored_status(code), expected, "status {code}");
        }
    }

    #[test]
    fn test_status_plain_without_color_flag() {
        let request = fixtures::request();
        let headers = HeaderMap::new();
        let mut exchange = fixtures::exchange(&request, &headers);
        exchange.status = StatusCode::NOT_FOUND;

        assert_eq!(extract(&exchange, "status", None), "404".into());
    }

    #[test]
    fn test_date_modes() {
        let request = fixtures::request();
        let headers = HeaderMap::new();
        let exchange = fixtures::exchange(&request, &headers);

        assert_eq!(
            extract(&exchange, "date", Some("clf")),
            "02/Jan/2024:03:04:05 +0000".into()
        );
        assert_eq!(
            extract(&exchange, "date", Some("iso")),
            "2024-01-02T03:04:05.678Z".into()
        );
        assert_eq!(
            extract(&exchange, "date", None),
            "Tue, 02 Jan 2024 03:04:05 GMT".into()
        );
        assert_eq!(extract(&exchange, "date", Some("unix")), TokenValue::Absent);
    }

    #[test]
    fn test_request_line_tokens() {
        let mut request = fixtures::request();
        request.uri = "/search?q=rust".parse().unwrap();
        request.version = Version::HTTP_2;
        let headers = HeaderMap::new();
        let exchange = fixtures::exchange(&request, &headers);

        assert_eq!(extract(&exchange, "method", None), "GET".into());
        assert_eq!(extract(&exchange, "url", None), "/search?q=rust".into());
        assert_eq!(extract(&exchange, "http-version", None), "2.0".into());
        assert_eq!(extract(&exchange, "response-time", None), "7".into());
    }

    #[test]
    fn test_client_identity_tokens() {
        let request = fixtures::request();
        let headers = HeaderMap::new();
        let exchange = fixtures::exchange(&request, &headers);

        assert_eq!(extract(&exchange, "remote-addr", None), "127.0.0.1".into());
        assert_eq!(extract(&exchange, "remote-user", None), "arworkacc".into());
        assert_eq!(extract(&exchange, "referrer", None), "http://localhost/".into());
        assert_eq!(extract(&exchange, "user-agent", None), "my-ua".into());
    }

    #[test]
    fn test_missing_identity_is_absent() {
        let request = RequestSnapshot::default();
        let headers = HeaderMap::new();
        let exchange = fixtures::exchange(&request, &headers);

        for name in ["remote-addr", "remote-user", "referrer", "user-agent"] {
            assert_eq!(extract(&exchange, name, None), TokenValue::Absent, "{name}");
        }
    }

    #[test]
    fn test_referrer_accepts_alternate_spelling() {
        let mut request = RequestSnapshot::default();
        request
            .headers
            .insert("referrer", "https://example.com/".parse().unwrap());
        let headers = HeaderMap::new();
        let exchange = fixtures::exchange(&request, &headers);

        assert_eq!(extract(&exchange, "referrer", None), "https://example.com/".into());
    }

    #[test]
    fn test_req_joins_multiple_values() {
        let mut request = RequestSnapshot::default();
        request.headers.append("set-cookie", "foo=bar".parse().unwrap());
        request.headers.append("set-cookie", "fizz=buzz".parse().unwrap());
        let headers = HeaderMap::new();
        let exchange = fixtures::exchange(&request, &headers);

        assert_eq!(
            extract(&exchange, "req", Some("Set-Cookie")),
            "foo=bar, fizz=buzz".into()
        );
        assert_eq!(extract(&exchange, "req", Some("does-not-exist")), "-".into());
        assert_eq!(extract(&exchange, "req", None), "-".into());
        assert_eq!(extract(&exchange, "req", Some("bad header")), "-".into());
    }

    #[test]
    fn test_res_headers_and_content_length() {
        let request = RequestSnapshot::default();
        let mut headers = HeaderMap::new();
        headers.append("x-keys", "foo".parse().unwrap());
        headers.append("x-keys", "bar".parse().unwrap());
        headers.insert(header::CONTENT_LENGTH, "999".parse().unwrap());
        let mut exchange = fixtures::exchange(&request, &headers);

        assert_eq!(extract(&exchange, "res", Some("X-Keys")), "foo, bar".into());
        assert_eq!(extract(&exchange, "res", Some("does-not-exist")), "-".into());
        assert_eq!(extract(&exchange, "res", Some("content-length")), "19".into());

        exchange.response_length = None;
        assert_eq!(extract(&exchange, "res", Some("content-length")), "0".into());
    }

    #[test]
    fn test_absent_text_substitution() {
        assert_eq!(TokenValue::Absent.as_text("undefined"), "undefined");
        assert_eq!(TokenValue::from("x").as_text("undefined"), "x");
        assert_eq!(TokenValue::from(None::<String>), TokenValue::Absent);
    }
}
