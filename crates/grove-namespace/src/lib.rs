//! Namespace abstraction for Grove.
//!
//! This crate defines what a routing namespace looks like from the outside:
//!
//! - [`Namespace`] trait with `children()`, `markers()`, and `read_template()`
//! - [`NodeMarkers`] describing what a node contributes (page, layout,
//!   submit handler, metadata, actions, API factories, error handlers)
//! - the component model handlers and layouts exchange: [`Markup`],
//!   [`Value`], and [`Rendered`] with its layout break variant
//! - [`RenderContext`], the per-request state passed down the layout chain
//! - [`MemoryNamespace`] for declaring a namespace in code
//!
//! Discovery over a namespace lives in `grove-router`; the directory-backed
//! provider lives in `grove-namespace-fs`.

mod context;
mod error;
mod handler;
mod markers;
mod markup;
mod memory;
mod namespace;
mod value;

pub use context::{Metadata, Method, RenderContext, RequestInfo, UnknownMethod};
pub use error::{NamespaceError, NamespaceErrorKind, RenderError};
pub use handler::{
    ErrorHandler, ErrorHandlers, ErrorInfo, ErrorKey, Handler, Layout, LayoutInput,
    MetadataProvider, MetadataSource, error_handler_fn, handler_fn, layout_fn, metadata_fn,
};
pub use markers::{ActionDef, ApiFactory, ApiRoute, NodeMarkers};
pub use markup::{Markup, SlotMap};
pub use memory::MemoryNamespace;
pub use namespace::{Namespace, join_path, split_path};
pub use value::{Rendered, ResponseOverride, Value, ValueShape};

/// Re-exported so implementors don't need their own dependency.
pub use async_trait::async_trait;
