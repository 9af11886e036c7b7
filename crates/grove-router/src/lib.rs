//! File-system style routing for Grove.
//!
//! Discovery turns a [`Namespace`](grove_namespace::Namespace) into a
//! [`RouteTable`]:
//!
//! - [`walk`] classifies node names into URL segments and prunes private
//!   subtrees
//! - [`capabilities`] resolves each node's markers into endpoints
//! - [`ChainBuilder`] assembles the layouts wrapping each endpoint
//! - [`ParsedTemplate`] handles slot/metadata text templates
//!
//! At request time [`RouteTable::render`] runs a route's handler and composes
//! its output through the layout chain.
//!
//! # Example
//!
//! ```ignore
//! use grove_namespace::{Markup, MemoryNamespace, handler_fn};
//! use grove_router::{RenderOptions, discover};
//!
//! let ns = MemoryNamespace::new()
//!     .with_template_layout("", "<body><!-- slot[children] --></body>")
//!     .with_page("users/_user_id_", handler_fn(|_| Ok(Markup::raw("<p>user</p>").into())));
//! let table = discover(&ns, RenderOptions::default())?;
//! assert_eq!(table.url_for("users.{user_id}.page", &[("user_id", "7")])?, "/users/7");
//! ```

mod chain;
mod discovery;
mod error;
mod markers;
mod render;
mod route;
mod segment;
mod template;
mod tree;
mod walker;

pub use chain::{ChainBuilder, LayoutChain, LayoutRef, TemplateLayout};
pub use discovery::discover;
pub use error::{ConfigurationError, UrlError};
pub use markers::{Capabilities, ResolvedAction, ResolvedApiRoute, capabilities};
pub use render::{compose, render_route};
pub use route::{RenderOptions, RouteEntry, RouteKind, RouteTable};
pub use segment::{
    Segment, SegmentDescriptor, SegmentError, classify, parse_relative_path, url_pattern,
};
pub use template::{CHILDREN_SLOT, MarkerKind, MissingMetadata, ParsedTemplate, TemplateError, Token};
pub use tree::{NamespaceNode, NamespaceTree, NodeId};
pub use walker::walk;
