//! Trusted HTML fragments.

use std::collections::BTreeMap;
use std::fmt;

/// Named slot values passed to a layout.
pub type SlotMap = BTreeMap<String, Markup>;

/// A fragment of HTML that is safe to emit as-is.
///
/// Construct with [`Markup::raw`] for trusted HTML or [`Markup::text`] to
/// escape arbitrary text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Markup(String);

impl Markup {
    /// Wrap trusted HTML without escaping.
    #[must_use]
    pub fn raw(html: impl Into<String>) -> Self {
        Self(html.into())
    }

    /// Escape text for use as HTML body content.
    #[must_use]
    pub fn text(text: &str) -> Self {
        Self(html_escape::encode_text(text).into_owned())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Markup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Markup {
    fn from(html: &str) -> Self {
        Self::raw(html)
    }
}

impl From<String> for Markup {
    fn from(html: String) -> Self {
        Self::raw(html)
    }
}
