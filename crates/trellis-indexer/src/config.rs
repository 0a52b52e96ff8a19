//! Index configuration, loaded from the vault root

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use trellis_core::DocId;

/// File name the configuration is read from, relative to the vault root.
pub const CONFIG_FILE: &str = ".trellis.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Frontmatter property naming a document's parents.
    pub parent_property: String,
    /// Frontmatter property naming a document's children.
    pub children_property: String,
    /// Vault-relative path prefixes excluded from indexing.
    pub excluded_paths: Vec<String>,
    /// Trailing-edge debounce window for rebuild requests, in milliseconds.
    pub debounce_ms: u64,
    /// Documents processed per rebuild chunk before yielding.
    pub chunk_size: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        IndexConfig {
            parent_property: "parent".to_string(),
            children_property: "children".to_string(),
            excluded_paths: Vec::new(),
            debounce_ms: 500,
            chunk_size: 500,
        }
    }
}

impl IndexConfig {
    /// Load `.trellis.toml` from under `root`, or defaults when absent.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// True when `id` equals an excluded prefix or sits underneath one.
    /// Prefixes match on whole path segments, so "Arch" does not exclude
    /// "Archive/Note.md".
    pub fn is_excluded(&self, id: &DocId) -> bool {
        let path = id.as_str();
        self.excluded_paths.iter().any(|prefix| {
            let prefix = prefix.trim_end_matches('/');
            if prefix.is_empty() {
                return false;
            }
            path == prefix
                || path
                    .strip_prefix(prefix)
                    .map_or(false, |rest| rest.starts_with('/'))
        })
    }
}
