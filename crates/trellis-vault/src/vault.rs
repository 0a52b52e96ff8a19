//! Vault scanning, metadata cache, and link resolution

use std::fmt;
use std::path::{Path, PathBuf};

use dashmap::DashMap;
use ignore::WalkBuilder;
use tracing::{debug, info, warn};
use trellis_core::DocId;
use trellis_indexer::{DocumentSource, MetadataSnapshot, ResolverBackend};

use crate::error::{Result, VaultError};
use crate::frontmatter;

/// A directory of markdown documents with their parsed frontmatter held in
/// memory. The watcher keeps the cache current, so index rebuilds read from
/// here instead of re-touching the filesystem.
pub struct Vault {
    root: PathBuf,
    /// Parsed frontmatter per document.
    metadata: DashMap<DocId, MetadataSnapshot>,
    /// Lowercase file stem -> documents carrying that name.
    names: DashMap<String, Vec<DocId>>,
}

impl Vault {
    /// Open the vault rooted at `root` and scan it for markdown documents.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(VaultError::NotADirectory(root));
        }
        // Watch events arrive with resolved paths; match them.
        let root = root.canonicalize()?;

        let vault = Vault {
            root,
            metadata: DashMap::new(),
            names: DashMap::new(),
        };
        vault.scan_tree(&vault.root.clone());
        info!(
            "vault opened: {} documents under {}",
            vault.doc_count(),
            vault.root.display()
        );
        Ok(vault)
    }

    /// Walk `path` and (re)load every markdown document under it. Returns
    /// the identifiers that were loaded.
    pub fn scan_tree(&self, path: &Path) -> Vec<DocId> {
        let mut loaded = Vec::new();
        for entry in WalkBuilder::new(path).hidden(true).build() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!("vault scan: {}", err);
                    continue;
                }
            };
            if !entry.file_type().map_or(false, |ft| ft.is_file()) {
                continue;
            }
            if let Some(doc) = self.doc_id(entry.path()) {
                self.load_document(&doc, entry.path());
                loaded.push(doc);
            }
        }
        loaded
    }

    /// Vault-relative identifier for a markdown file. `None` for paths
    /// outside the vault, non-markdown files, and hidden directories.
    pub fn doc_id(&self, path: &Path) -> Option<DocId> {
        if !is_markdown(path) {
            return None;
        }
        self.relative_path(path).map(DocId::new)
    }

    /// Vault-relative, slash-separated form of `path`. Components starting
    /// with a dot (`.obsidian/`, `.trellis.toml`) count as outside.
    pub fn relative_path(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let mut id = String::new();
        for component in relative.components() {
            let part = component.as_os_str().to_str()?;
            if part.starts_with('.') {
                return None;
            }
            if !id.is_empty() {
                id.push('/');
            }
            id.push_str(part);
        }
        (!id.is_empty()).then_some(id)
    }

    /// Absolute filesystem path for a document identifier.
    pub fn absolute_path(&self, doc: &DocId) -> PathBuf {
        self.root.join(doc.as_str())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn doc_count(&self) -> usize {
        self.metadata.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty()
    }

    /// Re-read a document from disk after a create or change event.
    pub fn upsert_document(&self, doc: &DocId) {
        let path = self.absolute_path(doc);
        self.load_document(doc, &path);
    }

    /// Drop a document from the cache and the name index.
    pub fn remove_document(&self, doc: &DocId) {
        self.metadata.remove(doc);
        let stem = doc.name().to_lowercase();
        if let Some(mut ids) = self.names.get_mut(&stem) {
            ids.retain(|id| id != doc);
        }
        self.names.remove_if(&stem, |_, ids| ids.is_empty());
        debug!("dropped {} from the vault cache", doc);
    }

    /// Move a document's cache entry, re-reading from the new location.
    pub fn rename_document(&self, from: &DocId, to: &DocId) {
        self.remove_document(from);
        self.upsert_document(to);
    }

    /// Documents whose path lies under `folder` (a vault-relative prefix).
    pub fn documents_under(&self, folder: &str) -> Vec<DocId> {
        let prefix = format!("{}/", folder.trim_end_matches('/'));
        self.metadata
            .iter()
            .filter(|entry| entry.key().as_str().starts_with(&prefix))
            .map(|entry| entry.key().clone())
            .collect()
    }

    fn load_document(&self, doc: &DocId, path: &Path) {
        let metadata = match std::fs::read_to_string(path) {
            Ok(content) => frontmatter::parse_frontmatter(doc, &content),
            Err(err) => {
                warn!("failed to read {}: {}", doc, err);
                MetadataSnapshot::new()
            }
        };
        {
            let mut ids = self.names.entry(doc.name().to_lowercase()).or_default();
            if !ids.contains(doc) {
                ids.push(doc.clone());
            }
        }
        self.metadata.insert(doc.clone(), metadata);
    }
}

impl DocumentSource for Vault {
    fn list_documents(&self) -> Vec<DocId> {
        self.metadata
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }

    fn metadata(&self, doc: &DocId) -> Option<MetadataSnapshot> {
        self.metadata.get(doc).map(|entry| entry.value().clone())
    }
}

impl ResolverBackend for Vault {
    /// Case-insensitive stem lookup. Documents in the referrer's own folder
    /// win over the rest of the vault; ties break to the smallest path, so
    /// resolution is deterministic however the vault was scanned.
    fn resolve_name(&self, name: &str, from: &DocId) -> Option<DocId> {
        let ids = self.names.get(&name.to_lowercase())?;
        let from_folder = folder_of(from.as_str());
        let sibling = ids
            .iter()
            .filter(|id| folder_of(id.as_str()) == from_folder)
            .min();
        sibling.or_else(|| ids.iter().min()).cloned()
    }

    fn resolve_path(&self, path: &str) -> Option<DocId> {
        let direct = DocId::new(path);
        if self.metadata.contains_key(&direct) {
            return Some(direct);
        }
        let with_ext = DocId::new(format!("{path}.md"));
        self.metadata.contains_key(&with_ext).then_some(with_ext)
    }
}

impl fmt::Debug for Vault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vault")
            .field("root", &self.root)
            .field("doc_count", &self.doc_count())
            .finish()
    }
}

/// Check if a path is a markdown document we index.
pub(crate) fn is_markdown(path: &Path) -> bool {
    matches!(path.extension().and_then(|ext| ext.to_str()), Some("md"))
}

fn folder_of(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(folder, _)| folder)
}
