use thiserror::Error;

/// Failure while turning a template into an access log line.
///
/// Missing request data is never an error; only a template that names a
/// token the registry does not know about fails to render.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("unknown format token `:{name}` at byte {offset}")]
    UnknownToken { name: String, offset: usize },
}

/// Returned when parsing a name that is not one of the built-in presets.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("`{0}` is not a preset format")]
pub struct UnknownPreset(pub String);
