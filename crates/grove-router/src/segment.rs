//! Segment classification.
//!
//! A namespace name is parametrized when wrapped symmetrically by `_` or by
//! braces around a non-empty interior: `_user_id_` and `{user_id}` both
//! normalize to `Param("user_id")`. Any other name starting with `_` or `.`
//! is private. Everything else is a literal URL segment.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Normalized form of one path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SegmentDescriptor {
    Literal(String),
    Param(String),
}

impl SegmentDescriptor {
    #[must_use]
    pub fn is_param(&self) -> bool {
        matches!(self, Self::Param(_))
    }

    /// Parameter name, if this segment captures one.
    #[must_use]
    pub fn param_name(&self) -> Option<&str> {
        match self {
            Self::Param(name) => Some(name),
            Self::Literal(_) => None,
        }
    }
}

impl fmt::Display for SegmentDescriptor {
    /// URL pattern form: literals as-is, parameters as `{name}`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(name) => f.write_str(name),
            Self::Param(name) => write!(f, "{{{name}}}"),
        }
    }
}

/// Result of classifying a namespace node name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Routable(SegmentDescriptor),
    /// Excluded together with its whole subtree.
    Private,
}

/// Why a name can't be used as a segment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SegmentError {
    #[error("parameter name '{0}' is not a valid identifier")]
    InvalidParam(String),
    #[error("segment must not be empty")]
    Empty,
    #[error("literal segment contains reserved character '{0}'")]
    ReservedChar(char),
}

const RESERVED: [char; 5] = ['/', '{', '}', '?', '#'];

fn param_interior(name: &str) -> Option<&str> {
    let interior = name
        .strip_prefix('{')
        .and_then(|rest| rest.strip_suffix('}'))
        .or_else(|| {
            (name.len() > 2)
                .then(|| name.strip_prefix('_').and_then(|rest| rest.strip_suffix('_')))
                .flatten()
        })?;
    (!interior.is_empty()).then_some(interior)
}

fn param(interior: &str) -> Result<SegmentDescriptor, SegmentError> {
    if IDENTIFIER.is_match(interior) {
        Ok(SegmentDescriptor::Param(interior.to_owned()))
    } else {
        Err(SegmentError::InvalidParam(interior.to_owned()))
    }
}

fn literal(name: &str) -> Result<SegmentDescriptor, SegmentError> {
    if name.is_empty() {
        return Err(SegmentError::Empty);
    }
    if let Some(c) = name.chars().find(|c| RESERVED.contains(c)) {
        return Err(SegmentError::ReservedChar(c));
    }
    Ok(SegmentDescriptor::Literal(name.to_owned()))
}

/// Classify a namespace node name.
pub fn classify(name: &str) -> Result<Segment, SegmentError> {
    if let Some(interior) = param_interior(name) {
        return param(interior).map(Segment::Routable);
    }
    if name.starts_with(['_', '.']) {
        return Ok(Segment::Private);
    }
    literal(name).map(Segment::Routable)
}

/// Parse a relative URL path such as `"/{item_id}/toggle"` into segments.
///
/// Only the brace syntax denotes a parameter here; underscores are ordinary
/// URL text. Empty segments are skipped, so `""` and `"/"` yield nothing.
pub fn parse_relative_path(path: &str) -> Result<Vec<SegmentDescriptor>, SegmentError> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|s| match s.strip_prefix('{').and_then(|r| r.strip_suffix('}')) {
            Some(interior) if !interior.is_empty() => param(interior),
            _ => literal(s),
        })
        .collect()
}

/// Render segments as a URL pattern with a leading slash.
#[must_use]
pub fn url_pattern(segments: &[SegmentDescriptor]) -> String {
    if segments.is_empty() {
        return "/".to_owned();
    }
    segments.iter().fold(String::new(), |mut out, segment| {
        out.push('/');
        out.push_str(&segment.to_string());
        out
    })
}
