//! Error types shared by namespace providers and request rendering.

use std::path::PathBuf;

use crate::handler::LayoutInput;
use crate::value::ValueShape;

/// Semantic error categories for namespace providers.
#[derive(Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum NamespaceErrorKind {
    /// Node or resource does not exist.
    NotFound,
    /// Permission denied.
    PermissionDenied,
    /// Invalid namespace path.
    InvalidPath,
    /// A resource exists but could not be parsed.
    Parse,
    /// Other/unknown error category.
    Other,
}

/// Namespace provider error with semantic kind and backend-specific source.
#[derive(Debug)]
pub struct NamespaceError {
    /// Semantic error category.
    pub kind: NamespaceErrorKind,
    /// Path context (if applicable).
    pub path: Option<PathBuf>,
    /// Backend identifier (e.g., "Fs", "Memory").
    pub backend: Option<&'static str>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl NamespaceError {
    #[must_use]
    pub fn new(kind: NamespaceErrorKind) -> Self {
        Self {
            kind,
            path: None,
            backend: None,
            source: None,
        }
    }

    /// Attach path context.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Attach backend identifier.
    #[must_use]
    pub fn with_backend(mut self, backend: &'static str) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Attach the underlying error source.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Downcast the source error to a concrete type.
    #[must_use]
    pub fn downcast_source<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.source.as_ref()?.downcast_ref()
    }

    #[must_use]
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::new(NamespaceErrorKind::NotFound).with_path(path)
    }

    /// Map an I/O error onto a namespace error.
    #[must_use]
    pub fn io(err: std::io::Error, path: Option<PathBuf>) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => NamespaceErrorKind::NotFound,
            std::io::ErrorKind::PermissionDenied => NamespaceErrorKind::PermissionDenied,
            _ => NamespaceErrorKind::Other,
        };
        let mut error = Self::new(kind).with_source(err);
        if let Some(p) = path {
            error = error.with_path(p);
        }
        error
    }
}

impl std::fmt::Display for NamespaceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Format: "[Backend] Kind: message (path: /foo/bar)"
        if let Some(backend) = self.backend {
            write!(f, "[{backend}] ")?;
        }

        let kind_str = match self.kind {
            NamespaceErrorKind::NotFound => "Not found",
            NamespaceErrorKind::PermissionDenied => "Permission denied",
            NamespaceErrorKind::InvalidPath => "Invalid path",
            NamespaceErrorKind::Parse => "Parse error",
            NamespaceErrorKind::Other => "Error",
        };

        write!(f, "{kind_str}")?;

        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }

        if let Some(path) = &self.path {
            write!(f, " (path: {})", path.display())?;
        }

        Ok(())
    }
}

impl std::error::Error for NamespaceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|s| s.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Request-time rendering failure.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// A template referenced metadata that no provider supplied.
    #[error("metadata key '{key}' is not available")]
    MissingMetadata { key: String },
    /// A layout received a value of a shape it doesn't accept.
    #[error("layout at '{layout}' expects {expected}, got {found}")]
    TypeMismatch {
        /// Namespace path of the layout's node.
        layout: String,
        expected: LayoutInput,
        found: ValueShape,
    },
    /// The chain finished on something that can't be served.
    #[error("final value must be a component or a response, got {found}")]
    NotRenderable { found: ValueShape },
    /// The request itself is malformed.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// A handler, layout or provider failed.
    #[error("handler failed: {0}")]
    Handler(String),
}

impl RenderError {
    /// Wrap any displayable failure from user code.
    pub fn handler(err: impl std::fmt::Display) -> Self {
        Self::Handler(err.to_string())
    }

    /// HTTP status this error maps to when no error handler intercepts it.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            Self::BadRequest(_) => 400,
            _ => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn test_namespace_error_new() {
        let err = NamespaceError::new(NamespaceErrorKind::NotFound);
        assert_eq!(err.kind, NamespaceErrorKind::NotFound);
        assert!(err.path.is_none());
        assert!(err.backend.is_none());
    }

    #[test]
    fn test_namespace_error_with_path() {
        let err = NamespaceError::not_found("/app/users");
        assert_eq!(err.path.as_deref(), Some(Path::new("/app/users")));
    }

    #[test]
    fn test_namespace_error_io_kind() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = NamespaceError::io(io_err, Some(PathBuf::from("/app")));
        assert_eq!(err.kind, NamespaceErrorKind::PermissionDenied);
        assert!(err.downcast_source::<std::io::Error>().is_some());
    }

    #[test]
    fn test_namespace_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = NamespaceError::io(io_err, Some(PathBuf::from("/app/x")))
            .with_backend("Fs");
        assert_eq!(err.to_string(), "[Fs] Not found: gone (path: /app/x)");
    }

    #[test]
    fn test_render_error_status() {
        assert_eq!(RenderError::BadRequest("no id".to_owned()).status(), 400);
        assert_eq!(
            RenderError::MissingMetadata {
                key: "title".to_owned()
            }
            .status(),
            500
        );
    }

    #[test]
    fn test_type_mismatch_message() {
        let err = RenderError::TypeMismatch {
            layout: "users".to_owned(),
            expected: LayoutInput::Component,
            found: ValueShape::Slots,
        };
        assert_eq!(
            err.to_string(),
            "layout at 'users' expects a component, got slot mapping"
        );
    }
}
