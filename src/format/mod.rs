//! Log formats: the built-in presets and the render pass that turns a
//! template into one access log line.

use std::{borrow::Cow, fmt, ops::Range, str::FromStr};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    error::{RenderError, UnknownPreset},
    exchange::Exchange,
    tokens::{TokenInput, TokenRegistry},
};

// Apache combined log format.
const COMBINED: &str = r#":remote-addr - :remote-user [:date[clf]] ":method :url HTTP/:http-version" :status :res[content-length] ":referrer" ":user-agent""#;

// Apache common log format.
const COMMON: &str =
    r#":remote-addr - :remote-user [:date[clf]] ":method :url HTTP/:http-version" :status :res[content-length]"#;

const DEV: &str = ":method :url :status :response-time ms - :res[content-length]";

const SHORT: &str = ":remote-addr :remote-user :method :url HTTP/:http-version :status :res[content-length] - :response-time ms";

const TINY: &str = ":method :url :status :res[content-length] - :response-time ms";

static TOKEN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r":([-A-Za-z0-9_]{2,})(?:\[([^\]]+)\])?").expect("token pattern is a valid regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Preset {
    Combined,
    Common,
    /// Alias of [`Preset::Combined`].
    Default,
    Dev,
    Short,
    Tiny,
}

impl Preset {
    pub const ALL: [Preset; 6] = [
        Preset::Combined,
        Preset::Common,
        Preset::Default,
        Preset::Dev,
        Preset::Short,
        Preset::Tiny,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|preset| preset.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Preset::Combined => "combined",
            Preset::Common => "common",
            Preset::Default => "default",
            Preset::Dev => "dev",
            Preset::Short => "short",
            Preset::Tiny => "tiny",
        }
    }

    pub fn template(self) -> &'static str {
        match self {
            Preset::Combined | Preset::Default => COMBINED,
            Preset::Common => COMMON,
            Preset::Dev => DEV,
            Preset::Short => SHORT,
            Preset::Tiny => TINY,
        }
    }
}

impl FromStr for Preset {
    type Err = UnknownPreset;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::from_name(name).ok_or_else(|| UnknownPreset(name.to_owned()))
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One `:name[arg]` occurrence inside a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRef<'t> {
    pub name: &'t str,
    pub arg: Option<&'t str>,
    /// Byte range of the whole reference, brackets included.
    pub span: Range<usize>,
}

/// Settings that vary per logger rather than per template.
#[derive(Debug, Clone, Copy)]
pub struct RenderSettings<'s> {
    pub colored: bool,
    /// Substituted for tokens that have no value.
    pub absent_text: &'s str,
}

impl Default for RenderSettings<'_> {
    fn default() -> Self {
        Self {
            colored: false,
            absent_text: "undefined",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: Cow<'static, str>,
    preset: Option<Preset>,
}

impl Template {
    /// Use the preset called `format` if there is one, otherwise treat
    /// `format` itself as the template.
    pub fn resolve(format: &str) -> Self {
        match Preset::from_name(format) {
            Some(preset) => Self::from(preset),
            None => Self::literal(format),
        }
    }

    pub fn literal(source: impl Into<String>) -> Self {
        Self {
            source: Cow::Owned(source.into()),
            preset: None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn preset(&self) -> Option<Preset> {
        self.preset
    }

    /// Token references in the order they appear.
    pub fn references(&self) -> impl Iterator<Item = TokenRef<'_>> + '_ {
        TOKEN_PATTERN.captures_iter(&self.source).filter_map(|captures| {
            let whole = captures.get(0)?;
            Some(TokenRef {
                name: captures.get(1)?.as_str(),
                arg: captures.get(2).map(|arg| arg.as_str()),
                span: whole.range(),
            })
        })
    }

    /// Check every reference against the registry without rendering.
    pub fn validate(&self, registry: &TokenRegistry) -> Result<(), RenderError> {
        match self.references().find(|r| !registry.contains(r.name)) {
            Some(unknown) => Err(unknown_token(&unknown)),
            None => Ok(()),
        }
    }

    /// Substitute every token reference with its extracted value.
    pub fn render(
        &self,
        registry: &TokenRegistry,
        exchange: &Exchange<'_>,
        settings: &RenderSettings<'_>,
    ) -> Result<String, RenderError> {
        let mut line = String::with_capacity(self.source.len() + 64);
        let mut cursor = 0;

        for reference in self.references() {
            let extractor = registry
                .get(reference.name)
                .ok_or_else(|| unknown_token(&reference))?;

            let input = TokenInput {
                arg: reference.arg,
                colored: settings.colored && reference.name == "status",
            };
            let value = extractor(exchange, &input);

            line.push_str(&self.source[cursor..reference.span.start]);
            line.push_str(value.as_text(settings.absent_text));
            cursor = reference.span.end;
        }

        line.push_str(&self.source[cursor..]);
        Ok(line)
    }
}

impl From<Preset> for Template {
    fn from(preset: Preset) -> Self {
        Self {
            source: Cow::Borrowed(preset.template()),
            preset: Some(preset),
        }
    }
}

impl Default for Template {
    fn default() -> Self {
        Self::from(Preset::Default)
    }
}

fn unknown_token(reference: &TokenRef<'_>) -> RenderError {
    RenderError::UnknownToken {
        name: reference.name.to_owned(),
        offset: reference.span.start,
    }
}
