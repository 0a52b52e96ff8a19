//! YAML frontmatter extraction

use tracing::warn;
use trellis_core::DocId;
use trellis_indexer::MetadataSnapshot;

/// Split the leading YAML frontmatter block from markdown content.
///
/// The opening fence must be the first line of the file. Returns the raw
/// YAML (fences stripped) and the remaining body.
pub fn split_frontmatter(content: &str) -> (Option<&str>, &str) {
    if let Some(rest) = content.strip_prefix("---\n") {
        if let Some(end) = rest.find("\n---\n") {
            return (Some(&rest[..end]), &rest[end + 5..]);
        }
        // Closing fence at end-of-file without a trailing newline.
        if let Some(yaml) = rest.strip_suffix("\n---") {
            return (Some(yaml), "");
        }
    }

    // Windows line endings.
    if let Some(rest) = content.strip_prefix("---\r\n") {
        if let Some(end) = rest.find("\r\n---\r\n") {
            return (Some(&rest[..end]), &rest[end + 7..]);
        }
        if let Some(yaml) = rest.strip_suffix("\r\n---") {
            return (Some(yaml), "");
        }
    }

    (None, content)
}

/// Parse a document's frontmatter into a metadata snapshot.
///
/// Vault authoring is ongoing and imperfect, so malformed or non-mapping
/// YAML downgrades to an empty snapshot with a warning instead of failing
/// the document.
pub fn parse_frontmatter(doc: &DocId, content: &str) -> MetadataSnapshot {
    let (Some(yaml), _) = split_frontmatter(content) else {
        return MetadataSnapshot::new();
    };
    match serde_yaml::from_str::<Option<MetadataSnapshot>>(yaml) {
        Ok(snapshot) => snapshot.unwrap_or_default(),
        Err(err) => {
            warn!("{}: ignoring malformed frontmatter: {}", doc, err);
            MetadataSnapshot::new()
        }
    }
}
