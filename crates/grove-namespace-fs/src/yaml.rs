//! YAML metadata parsing for directory namespaces.

use grove_namespace::Metadata;

/// Parse a metadata file into page metadata.
///
/// Empty content yields empty metadata. The document must be a mapping.
pub(crate) fn parse_metadata(content: &str) -> Result<Metadata, serde_yaml::Error> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Ok(Metadata::default());
    }
    serde_yaml::from_str(trimmed)
}
