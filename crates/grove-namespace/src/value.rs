//! Values flowing through a layout chain.
//!
//! Every handler and layout produces a [`Rendered`] value. [`Rendered::Broken`]
//! is the layout break: the wrapped value is served as-is and no further
//! ancestor layout runs.

use std::fmt;

use crate::markup::{Markup, SlotMap};

/// Explicit HTTP response that bypasses layout composition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseOverride {
    /// HTTP status code.
    pub status: u16,
    /// Response headers in insertion order.
    pub headers: Vec<(String, String)>,
    /// Response body.
    pub body: String,
}

impl ResponseOverride {
    /// Create an empty response with the given status.
    #[must_use]
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: String::new(),
        }
    }

    /// `303 See Other` redirect, the usual answer to a form submission.
    #[must_use]
    pub fn redirect(location: impl Into<String>) -> Self {
        Self::new(303).with_header("location", location)
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }
}

/// The payload of a rendered value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A single renderable component.
    Component(Markup),
    /// Named slot values for a layout.
    Slots(SlotMap),
    /// Explicit response, returned untouched.
    Response(ResponseOverride),
    /// Structured data, only servable from API routes.
    Data(serde_json::Value),
}

/// Coarse shape of a [`Value`], used in error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape {
    Component,
    Slots,
    Response,
    Data,
}

impl fmt::Display for ValueShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Component => "component",
            Self::Slots => "slot mapping",
            Self::Response => "response",
            Self::Data => "data",
        };
        f.write_str(name)
    }
}

impl Value {
    /// Create a component from trusted HTML.
    #[must_use]
    pub fn component(html: impl Into<String>) -> Self {
        Self::Component(Markup::raw(html))
    }

    /// Create a slot mapping from `(name, html)` pairs.
    #[must_use]
    pub fn slots<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Markup>,
    {
        Self::Slots(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    #[must_use]
    pub fn shape(&self) -> ValueShape {
        match self {
            Self::Component(_) => ValueShape::Component,
            Self::Slots(_) => ValueShape::Slots,
            Self::Response(_) => ValueShape::Response,
            Self::Data(_) => ValueShape::Data,
        }
    }
}

impl From<Markup> for Value {
    fn from(markup: Markup) -> Self {
        Self::Component(markup)
    }
}

impl From<ResponseOverride> for Value {
    fn from(response: ResponseOverride) -> Self {
        Self::Response(response)
    }
}

impl From<SlotMap> for Value {
    fn from(slots: SlotMap) -> Self {
        Self::Slots(slots)
    }
}

/// Output of a handler or layout.
#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    /// Continue composing through the remaining layouts.
    Plain(Value),
    /// Serve this value and stop ascending the layout chain.
    Broken(Value),
}

impl Rendered {
    /// Mark a value as the final output for this request.
    #[must_use]
    pub fn layout_break(value: impl Into<Value>) -> Self {
        Self::Broken(value.into())
    }

    #[must_use]
    pub fn is_broken(&self) -> bool {
        matches!(self, Self::Broken(_))
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        match self {
            Self::Plain(value) | Self::Broken(value) => value,
        }
    }
}

impl From<Value> for Rendered {
    fn from(value: Value) -> Self {
        Self::Plain(value)
    }
}

impl From<Markup> for Rendered {
    fn from(markup: Markup) -> Self {
        Self::Plain(Value::Component(markup))
    }
}

impl From<ResponseOverride> for Rendered {
    fn from(response: ResponseOverride) -> Self {
        Self::Plain(Value::Response(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect() {
        let response = ResponseOverride::redirect("/todos");
        assert_eq!(response.status, 303);
        assert_eq!(
            response.headers,
            vec![("location".to_owned(), "/todos".to_owned())]
        );
    }

    #[test]
    fn test_value_shape() {
        assert_eq!(Value::component("<p/>").shape(), ValueShape::Component);
        assert_eq!(
            Value::slots([("title", "Hi")]).shape(),
            ValueShape::Slots
        );
        assert_eq!(
            Value::from(ResponseOverride::new(204)).shape(),
            ValueShape::Response
        );
        assert_eq!(ValueShape::Slots.to_string(), "slot mapping");
    }

    #[test]
    fn test_layout_break() {
        let rendered = Rendered::layout_break(Markup::raw("<div>x</div>"));
        assert!(rendered.is_broken());
        assert_eq!(rendered.into_value(), Value::component("<div>x</div>"));
    }

    #[test]
    fn test_plain_from_markup() {
        let rendered: Rendered = Markup::raw("<p>a</p>").into();
        assert!(!rendered.is_broken());
    }
}
