//! Directory inspection.
//!
//! Separates looking at a directory (which children and marker files exist)
//! from turning marker files into handlers, which `FsNamespace` does.

use std::fs;
use std::path::{Path, PathBuf};

/// Marker file names looked for in every directory.
#[derive(Debug, Clone)]
pub struct MarkerFiles {
    /// Template layout file (default `layout.html`).
    pub layout: String,
    /// Static page file (default `page.html`).
    pub page: String,
    /// Page metadata file (default `meta.yaml`).
    pub metadata: String,
}

impl Default for MarkerFiles {
    fn default() -> Self {
        Self {
            layout: "layout.html".to_owned(),
            page: "page.html".to_owned(),
            metadata: "meta.yaml".to_owned(),
        }
    }
}

/// Marker files found in one directory. Nothing is read at this stage.
#[derive(Debug, Default)]
pub(crate) struct DirectoryRef {
    pub layout_path: Option<PathBuf>,
    pub page_path: Option<PathBuf>,
    pub meta_path: Option<PathBuf>,
}

/// Names of subdirectories of `dir`, sorted.
///
/// Non-UTF-8 names are skipped since they can't form URL segments.
pub(crate) fn list_subdirectories(dir: &Path) -> std::io::Result<Vec<String>> {
    let mut names: Vec<String> = fs::read_dir(dir)?
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_ok_and(|t| t.is_dir()))
        .filter_map(|e| e.file_name().into_string().ok())
        .collect();
    names.sort();
    Ok(names)
}

/// Locate marker files directly inside `dir`.
pub(crate) fn inspect_directory(dir: &Path, files: &MarkerFiles) -> DirectoryRef {
    let existing = |name: &str| {
        let path = dir.join(name);
        path.is_file().then_some(path)
    };
    DirectoryRef {
        layout_path: existing(&files.layout),
        page_path: existing(&files.page),
        meta_path: existing(&files.metadata),
    }
}
