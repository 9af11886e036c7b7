//! Callable marker entities: handlers, layouts, metadata providers and
//! error handlers.
//!
//! All of them are async trait objects shared behind `Arc`. The `*_fn`
//! constructors wrap synchronous closures for the common case.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::context::{Metadata, RenderContext};
use crate::error::RenderError;
use crate::value::{Rendered, Value, ValueShape};

/// Endpoint body: page, submit handler, action or API route.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn call(&self, cx: &mut RenderContext) -> Result<Rendered, RenderError>;
}

/// What a structured layout is willing to wrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutInput {
    /// A single component.
    Component,
    /// A named slot mapping.
    Slots,
    /// Either of the above.
    Any,
}

impl LayoutInput {
    /// Whether a value of `shape` may be passed to the layout.
    #[must_use]
    pub fn admits(self, shape: ValueShape) -> bool {
        matches!(
            (self, shape),
            (Self::Component | Self::Any, ValueShape::Component)
                | (Self::Slots | Self::Any, ValueShape::Slots)
        )
    }
}

impl fmt::Display for LayoutInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Component => "a component",
            Self::Slots => "a slot mapping",
            Self::Any => "a component or slot mapping",
        };
        f.write_str(text)
    }
}

/// Structured layout wrapping the output of everything beneath its node.
#[async_trait]
pub trait Layout: Send + Sync {
    fn accepts(&self) -> LayoutInput {
        LayoutInput::Any
    }

    async fn wrap(&self, child: Value, cx: &mut RenderContext) -> Result<Rendered, RenderError>;
}

/// Computes page metadata per request.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    async fn metadata(&self, cx: &RenderContext) -> Result<Metadata, RenderError>;
}

/// Where an endpoint's metadata comes from.
#[derive(Clone)]
pub enum MetadataSource {
    Static(Metadata),
    Dynamic(Arc<dyn MetadataProvider>),
}

impl MetadataSource {
    pub async fn resolve(&self, cx: &RenderContext) -> Result<Metadata, RenderError> {
        match self {
            Self::Static(metadata) => Ok(metadata.clone()),
            Self::Dynamic(provider) => provider.metadata(cx).await,
        }
    }
}

impl fmt::Debug for MetadataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(metadata) => f.debug_tuple("Static").field(metadata).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

impl From<Metadata> for MetadataSource {
    fn from(metadata: Metadata) -> Self {
        Self::Static(metadata)
    }
}

/// Which failures an error handler intercepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorKey {
    /// Any response with this HTTP status (e.g. 404 for unmatched paths).
    Status(u16),
    /// Any [`RenderError`] raised while rendering a route.
    Render,
}

/// Failure description passed to an error handler.
#[derive(Debug, Clone)]
pub struct ErrorInfo {
    pub status: u16,
    pub message: String,
}

/// Application-level error page.
#[async_trait]
pub trait ErrorHandler: Send + Sync {
    async fn handle(&self, error: &ErrorInfo, cx: &mut RenderContext) -> Result<Value, RenderError>;
}

/// Root error handler map.
pub type ErrorHandlers = BTreeMap<ErrorKey, Arc<dyn ErrorHandler>>;

struct FnHandler<F>(F);

#[async_trait]
impl<F> Handler for FnHandler<F>
where
    F: Fn(&mut RenderContext) -> Result<Rendered, RenderError> + Send + Sync,
{
    async fn call(&self, cx: &mut RenderContext) -> Result<Rendered, RenderError> {
        (self.0)(cx)
    }
}

/// Wrap a synchronous closure as a [`Handler`].
pub fn handler_fn<F>(f: F) -> Arc<dyn Handler>
where
    F: Fn(&mut RenderContext) -> Result<Rendered, RenderError> + Send + Sync + 'static,
{
    Arc::new(FnHandler(f))
}

struct FnLayout<F> {
    accepts: LayoutInput,
    f: F,
}

#[async_trait]
impl<F> Layout for FnLayout<F>
where
    F: Fn(Value, &mut RenderContext) -> Result<Rendered, RenderError> + Send + Sync,
{
    fn accepts(&self) -> LayoutInput {
        self.accepts
    }

    async fn wrap(&self, child: Value, cx: &mut RenderContext) -> Result<Rendered, RenderError> {
        (self.f)(child, cx)
    }
}

/// Wrap a synchronous closure as a [`Layout`] accepting `accepts`.
pub fn layout_fn<F>(accepts: LayoutInput, f: F) -> Arc<dyn Layout>
where
    F: Fn(Value, &mut RenderContext) -> Result<Rendered, RenderError> + Send + Sync + 'static,
{
    Arc::new(FnLayout { accepts, f })
}

struct FnMetadata<F>(F);

#[async_trait]
impl<F> MetadataProvider for FnMetadata<F>
where
    F: Fn(&RenderContext) -> Result<Metadata, RenderError> + Send + Sync,
{
    async fn metadata(&self, cx: &RenderContext) -> Result<Metadata, RenderError> {
        (self.0)(cx)
    }
}

/// Wrap a synchronous closure as a dynamic [`MetadataSource`].
pub fn metadata_fn<F>(f: F) -> MetadataSource
where
    F: Fn(&RenderContext) -> Result<Metadata, RenderError> + Send + Sync + 'static,
{
    MetadataSource::Dynamic(Arc::new(FnMetadata(f)))
}

struct FnErrorHandler<F>(F);

#[async_trait]
impl<F> ErrorHandler for FnErrorHandler<F>
where
    F: Fn(&ErrorInfo, &mut RenderContext) -> Result<Value, RenderError> + Send + Sync,
{
    async fn handle(&self, error: &ErrorInfo, cx: &mut RenderContext) -> Result<Value, RenderError> {
        (self.0)(error, cx)
    }
}

/// Wrap a synchronous closure as an [`ErrorHandler`].
pub fn error_handler_fn<F>(f: F) -> Arc<dyn ErrorHandler>
where
    F: Fn(&ErrorInfo, &mut RenderContext) -> Result<Value, RenderError> + Send + Sync + 'static,
{
    Arc::new(FnErrorHandler(f))
}
