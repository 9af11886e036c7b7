//! Slot template engine.
//!
//! Template layouts are plain HTML with two kinds of markers:
//!
//! ```text
//! <!-- slot[NAME] -->     replaced by slot content
//! {metadata[KEY]}         replaced by an escaped metadata value
//! ```
//!
//! `NAME` and `KEY` match `[A-Za-z_][A-Za-z0-9_]*`. Markers don't nest. Any
//! text that opens a marker (`<!-- slot[` or `{metadata[`) but doesn't
//! complete one is rejected when the template is parsed, so rendering never
//! sees a malformed marker.

use std::fmt;
use std::sync::LazyLock;

use grove_namespace::{Markup, Metadata, RenderError, SlotMap};
use regex::Regex;

static MARKER_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<!-- slot\[|\{metadata\[").unwrap());

static SLOT_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<!-- slot\[([A-Za-z_][A-Za-z0-9_]*)\] -->").unwrap());

static METADATA_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\{metadata\[([A-Za-z_][A-Za-z0-9_]*)\]\}").unwrap());

/// Slot name bound to a single upstream component.
pub const CHILDREN_SLOT: &str = "children";

/// Template piece.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Literal(String),
    Slot(String),
    Metadata(String),
}

/// Which marker grammar a parse error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Slot,
    Metadata,
}

impl fmt::Display for MarkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Slot => f.write_str("slot"),
            Self::Metadata => f.write_str("metadata"),
        }
    }
}

/// Malformed or unterminated marker.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed {kind} marker at line {line}, column {column}")]
pub struct TemplateError {
    pub kind: MarkerKind,
    /// 1-based.
    pub line: usize,
    /// 1-based, in characters.
    pub column: usize,
}

/// Behavior for `{metadata[KEY]}` when `KEY` was never supplied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissingMetadata {
    /// Fail the request with [`RenderError::MissingMetadata`].
    #[default]
    Error,
    /// Interpolate nothing.
    Empty,
}

/// A template split into tokens, parsed once at discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTemplate {
    tokens: Vec<Token>,
}

fn position(text: &str, offset: usize) -> (usize, usize) {
    let before = &text[..offset];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    let column = before[line_start..].chars().count() + 1;
    (line, column)
}

fn display_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl ParsedTemplate {
    /// Tokenize template text.
    ///
    /// Adjacent literal text is merged into one token.
    pub fn parse(text: &str) -> Result<Self, TemplateError> {
        let mut tokens = Vec::new();
        let mut literal_start = 0;
        let mut cursor = 0;

        while let Some(open) = MARKER_OPEN.find_at(text, cursor) {
            let rest = &text[open.start()..];
            let (kind, re) = if rest.starts_with('<') {
                (MarkerKind::Slot, &*SLOT_MARKER)
            } else {
                (MarkerKind::Metadata, &*METADATA_MARKER)
            };

            let Some(caps) = re.captures(rest) else {
                let (line, column) = position(text, open.start());
                return Err(TemplateError { kind, line, column });
            };

            if open.start() > literal_start {
                tokens.push(Token::Literal(text[literal_start..open.start()].to_owned()));
            }
            let name = caps[1].to_owned();
            tokens.push(match kind {
                MarkerKind::Slot => Token::Slot(name),
                MarkerKind::Metadata => Token::Metadata(name),
            });

            cursor = open.start() + caps[0].len();
            literal_start = cursor;
        }

        if literal_start < text.len() {
            tokens.push(Token::Literal(text[literal_start..].to_owned()));
        }

        Ok(Self { tokens })
    }

    #[must_use]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Names of all slots the template exposes, in order of appearance.
    pub fn slot_names(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().filter_map(|token| match token {
            Token::Slot(name) => Some(name.as_str()),
            _ => None,
        })
    }

    /// Template text equivalent to the parsed tokens.
    #[must_use]
    pub fn reconstruct(&self) -> String {
        let mut out = String::new();
        for token in &self.tokens {
            match token {
                Token::Literal(text) => out.push_str(text),
                Token::Slot(name) => {
                    out.push_str("<!-- slot[");
                    out.push_str(name);
                    out.push_str("] -->");
                }
                Token::Metadata(key) => {
                    out.push_str("{metadata[");
                    out.push_str(key);
                    out.push_str("]}");
                }
            }
        }
        out
    }

    /// Fill the template.
    ///
    /// A slot takes its value from `slots`, then `defaults`, else renders
    /// empty. Metadata values are HTML-escaped.
    pub fn render(
        &self,
        slots: &SlotMap,
        defaults: &SlotMap,
        metadata: &Metadata,
        missing: MissingMetadata,
    ) -> Result<Markup, RenderError> {
        let mut out = String::new();
        for token in &self.tokens {
            match token {
                Token::Literal(text) => out.push_str(text),
                Token::Slot(name) => {
                    if let Some(content) = slots.get(name).or_else(|| defaults.get(name)) {
                        out.push_str(content.as_str());
                    }
                }
                Token::Metadata(key) => match (metadata.get(key), missing) {
                    (Some(value), _) => {
                        out.push_str(&html_escape::encode_quoted_attribute(&display_value(value)));
                    }
                    (None, MissingMetadata::Empty) => {}
                    (None, MissingMetadata::Error) => {
                        return Err(RenderError::MissingMetadata { key: key.clone() });
                    }
                },
            }
        }
        Ok(Markup::raw(out))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn slots(entries: &[(&str, &str)]) -> SlotMap {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_owned(), Markup::raw(*v)))
            .collect()
    }

    fn render(template: &str, values: &SlotMap, defaults: &SlotMap) -> String {
        ParsedTemplate::parse(template)
            .unwrap()
            .render(values, defaults, &Metadata::new(), MissingMetadata::Error)
            .unwrap()
            .into_string()
    }

    #[test]
    fn test_parse_tokens() {
        let template =
            ParsedTemplate::parse("<title>{metadata[title]}</title><!-- slot[children] -->!")
                .unwrap();
        assert_eq!(
            template.tokens(),
            &[
                Token::Literal("<title>".to_owned()),
                Token::Metadata("title".to_owned()),
                Token::Literal("</title>".to_owned()),
                Token::Slot("children".to_owned()),
                Token::Literal("!".to_owned()),
            ]
        );
    }

    #[test]
    fn test_parse_plain_text() {
        let template = ParsedTemplate::parse("<p>no markers</p>").unwrap();
        assert_eq!(
            template.tokens(),
            &[Token::Literal("<p>no markers</p>".to_owned())]
        );
        assert!(ParsedTemplate::parse("").unwrap().tokens().is_empty());
    }

    #[test]
    fn test_parse_adjacent_markers() {
        let template = ParsedTemplate::parse("<!-- slot[a] --><!-- slot[b] -->").unwrap();
        assert_eq!(template.slot_names().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_lookalikes_stay_literal() {
        let text = "<!-- slot --> {metadata} <!-- comment --> {title}";
        let template = ParsedTemplate::parse(text).unwrap();
        assert_eq!(template.tokens(), &[Token::Literal(text.to_owned())]);
    }

    #[test]
    fn test_unterminated_slot_marker() {
        let err = ParsedTemplate::parse("<main>\n  <!-- slot[children]\n</main>").unwrap_err();
        assert_eq!(
            err,
            TemplateError {
                kind: MarkerKind::Slot,
                line: 2,
                column: 3,
            }
        );
    }

    #[test]
    fn test_invalid_metadata_key() {
        let err = ParsedTemplate::parse("<h1>{metadata[page-title]}</h1>").unwrap_err();
        assert_eq!(err.kind, MarkerKind::Metadata);
        assert_eq!((err.line, err.column), (1, 5));
    }

    #[test]
    fn test_nested_markers_rejected() {
        let err = ParsedTemplate::parse("<!-- slot[{metadata[x]}] -->").unwrap_err();
        assert_eq!(err.kind, MarkerKind::Slot);
    }

    #[test]
    fn test_slot_spacing_is_exact() {
        assert!(ParsedTemplate::parse("<!-- slot[a]-->").is_err());
        assert!(ParsedTemplate::parse("<!-- slot[ a ] -->").is_err());
    }

    #[test]
    fn test_children_slot_resolution_order() {
        let template = "<main><!-- slot[children] --></main>";
        let empty = SlotMap::new();
        let defaults = slots(&[("children", "X")]);
        let explicit = slots(&[("children", "Y")]);

        assert_eq!(render(template, &empty, &empty), "<main></main>");
        assert_eq!(render(template, &empty, &defaults), "<main>X</main>");
        assert_eq!(render(template, &explicit, &defaults), "<main>Y</main>");
    }

    #[test]
    fn test_unfilled_slots_render_empty() {
        let template = "<nav><!-- slot[navbar] --></nav><!-- slot[children] -->";
        let values = slots(&[("children", "<p>body</p>")]);
        assert_eq!(
            render(template, &values, &SlotMap::new()),
            "<nav></nav><p>body</p>"
        );
    }

    #[test]
    fn test_metadata_interpolation_escapes() {
        let template = ParsedTemplate::parse("<title>{metadata[title]}</title>").unwrap();
        let metadata = Metadata::new().with("title", "Tom & \"Jerry\"");
        let out = template
            .render(
                &SlotMap::new(),
                &SlotMap::new(),
                &metadata,
                MissingMetadata::Error,
            )
            .unwrap();
        assert_eq!(out.as_str(), "<title>Tom &amp; &quot;Jerry&quot;</title>");
    }

    #[test]
    fn test_metadata_non_string_values() {
        let template = ParsedTemplate::parse("{metadata[n]}|{metadata[flag]}|{metadata[none]}").unwrap();
        let metadata = Metadata::new()
            .with("n", 42)
            .with("flag", true)
            .with("none", json!(null));
        let out = template
            .render(
                &SlotMap::new(),
                &SlotMap::new(),
                &metadata,
                MissingMetadata::Error,
            )
            .unwrap();
        assert_eq!(out.as_str(), "42|true|");
    }

    #[test]
    fn test_missing_metadata_policy() {
        let template = ParsedTemplate::parse("<h1>{metadata[title]}</h1>").unwrap();
        let err = template
            .render(
                &SlotMap::new(),
                &SlotMap::new(),
                &Metadata::new(),
                MissingMetadata::Error,
            )
            .unwrap_err();
        assert!(matches!(err, RenderError::MissingMetadata { ref key } if key == "title"));

        let out = template
            .render(
                &SlotMap::new(),
                &SlotMap::new(),
                &Metadata::new(),
                MissingMetadata::Empty,
            )
            .unwrap();
        assert_eq!(out.as_str(), "<h1></h1>");
    }

    #[test]
    fn test_reconstruct_round_trip() {
        let sources = [
            "",
            "plain",
            "<!-- slot[children] -->",
            "{metadata[a]}{metadata[b]}",
            "<html><head><title>{metadata[title]}</title></head>\n<body><!-- slot[navbar] -->\n<!-- slot[children] --></body></html>",
            "{metadata<!-- slot[x] -->{metadata[y]}<!-- slot",
        ];
        for source in sources {
            let parsed = ParsedTemplate::parse(source).unwrap();
            let reparsed = ParsedTemplate::parse(&parsed.reconstruct()).unwrap();
            assert_eq!(parsed, reparsed, "round trip failed for {source:?}");
            assert_eq!(parsed.reconstruct(), source);
        }
    }
}
