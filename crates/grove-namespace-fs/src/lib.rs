//! Directory-backed namespace for Grove.
//!
//! This crate provides [`FsNamespace`], an implementation of the
//! [`Namespace`](grove_namespace::Namespace) trait over a directory tree:
//!
//! - every directory is a namespace node, named after the directory
//! - `layout.html` is the node's template layout
//! - `page.html` is a static page served at the node
//! - `meta.yaml` is the page's static metadata
//!
//! Code-defined markers (structured layouts, dynamic pages, actions, APIs,
//! error handlers) are attached with a [`MemoryNamespace`] bindings overlay.
//! A binding wins over the file-based marker of the same kind.
//!
//! # Example
//!
//! ```ignore
//! use grove_namespace_fs::FsNamespace;
//!
//! let namespace = FsNamespace::new("app");
//! let routes = grove_router::discover(&namespace, Default::default())?;
//! ```

mod page;
mod scanner;
mod yaml;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use grove_namespace::{
    MemoryNamespace, MetadataSource, Namespace, NamespaceError, NamespaceErrorKind, NodeMarkers,
};

use page::StaticPage;
pub use scanner::MarkerFiles;
use scanner::{inspect_directory, list_subdirectories};
use yaml::parse_metadata;

/// Backend identifier for error messages.
const BACKEND: &str = "Fs";

/// Namespace read from a directory tree.
pub struct FsNamespace {
    root: PathBuf,
    files: MarkerFiles,
    bindings: MemoryNamespace,
}

impl FsNamespace {
    /// Create a namespace rooted at `root` with default marker file names.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            files: MarkerFiles::default(),
            bindings: MemoryNamespace::new(),
        }
    }

    /// Use custom marker file names.
    #[must_use]
    pub fn with_files(mut self, files: MarkerFiles) -> Self {
        self.files = files;
        self
    }

    /// Overlay code-defined markers on top of the directory tree.
    #[must_use]
    pub fn with_bindings(mut self, bindings: MemoryNamespace) -> Self {
        self.bindings = bindings;
        self
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn dir_for(&self, path: &str) -> PathBuf {
        path.split('/')
            .filter(|s| !s.is_empty())
            .fold(self.root.clone(), |dir, name| dir.join(name))
    }

    fn read_file(path: &Path) -> Result<String, NamespaceError> {
        std::fs::read_to_string(path)
            .map_err(|e| NamespaceError::io(e, Some(path.to_path_buf())).with_backend(BACKEND))
    }
}

impl Namespace for FsNamespace {
    fn children(&self, path: &str) -> Result<Vec<String>, NamespaceError> {
        let dir = self.dir_for(path);
        let bound = self.bindings.node_markers(path).is_some();
        // A bound node may exist only in code; the root directory must exist.
        let code_only = bound && !path.is_empty();

        let mut names = match list_subdirectories(&dir) {
            Ok(names) => names,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && code_only => Vec::new(),
            Err(e) => return Err(NamespaceError::io(e, Some(dir)).with_backend(BACKEND)),
        };

        if bound {
            names.extend(self.bindings.child_names(path));
            names.sort();
            names.dedup();
        }

        Ok(names)
    }

    fn markers(&self, path: &str) -> Result<NodeMarkers, NamespaceError> {
        let dir = self.dir_for(path);
        let found = inspect_directory(&dir, &self.files);
        let mut markers = self.bindings.node_markers(path).cloned().unwrap_or_default();

        if found.layout_path.is_some() {
            markers.template_layout = true;
        }

        if let Some(page_path) = &found.page_path {
            if markers.page.is_some() {
                tracing::debug!(path = %page_path.display(), "Page binding overrides page file");
            } else {
                let html = Self::read_file(page_path)?;
                markers.page = Some(Arc::new(StaticPage::new(html)));
            }
        }

        if let Some(meta_path) = &found.meta_path
            && markers.metadata.is_none()
        {
            let content = Self::read_file(meta_path)?;
            let metadata = parse_metadata(&content).map_err(|e| {
                NamespaceError::new(NamespaceErrorKind::Parse)
                    .with_path(meta_path)
                    .with_backend(BACKEND)
                    .with_source(e)
            })?;
            markers.metadata = Some(MetadataSource::Static(metadata));
        }

        Ok(markers)
    }

    fn read_template(&self, path: &str) -> Result<String, NamespaceError> {
        let layout_path = self.dir_for(path).join(&self.files.layout);
        if layout_path.is_file() {
            return Self::read_file(&layout_path);
        }
        self.bindings
            .template(path)
            .map(str::to_owned)
            .ok_or_else(|| NamespaceError::not_found(layout_path).with_backend(BACKEND))
    }
}
