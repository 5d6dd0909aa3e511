// HTTP Basic credentials, read only to report the `:remote-user` token.
// Nothing here authenticates the request.

use axum::http::{header, HeaderMap};
use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine,
};

// Clients are inconsistent about trailing `=` padding.
const BASIC_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub name: String,
    pub pass: String,
}

/// Parse the `Authorization` header of a request, if it carries Basic credentials.
pub fn parse(headers: &HeaderMap) -> Option<Credentials> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    parse_authorization(value)
}

/// Parse a raw `Authorization` value such as `Basic YXJ3b3JrYWNjOg==`.
pub fn parse_authorization(value: &str) -> Option<Credentials> {
    let (scheme, token) = value.trim_matches(' ').split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = BASIC_ENGINE.decode(token.trim_start_matches(' ')).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (name, pass) = decoded.split_once(':')?;

    Some(Credentials {
        name: name.to_owned(),
        pass: pass.to_owned(),
    })
}
