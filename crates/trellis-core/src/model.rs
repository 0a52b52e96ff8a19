//! Core data structures for the hierarchy index

use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Reserved identifier for the hidden root. Documents parented here are
/// tracked but excluded from the visible root listing.
pub const HIDDEN_ROOT: &str = "__hidden__";

/// Unique, stable identifier for a document: its vault-relative path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct DocId(String);

impl DocId {
    pub fn new(path: impl Into<String>) -> Self {
        DocId(path.into())
    }

    /// The identifier every hidden document is parented under.
    pub fn hidden_root() -> Self {
        DocId(HIDDEN_ROOT.to_string())
    }

    pub fn is_hidden_root(&self) -> bool {
        self.0 == HIDDEN_ROOT
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Display name: final path segment with the `.md` extension stripped.
    pub fn name(&self) -> &str {
        let base = self.0.rsplit('/').next().unwrap_or(&self.0);
        base.strip_suffix(".md").unwrap_or(base)
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocId {
    fn from(s: &str) -> Self {
        DocId(s.to_string())
    }
}

impl From<String> for DocId {
    fn from(s: String) -> Self {
        DocId(s)
    }
}

impl AsRef<str> for DocId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for DocId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// The relationships a single document currently declares, after link
/// resolution. This is the per-document record the updater diffs against
/// when the document changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    /// Identifiers this document names as its parents.
    pub parents: BTreeSet<DocId>,
    /// Identifiers this document names as its children.
    pub children: BTreeSet<DocId>,
}

impl Declaration {
    pub fn is_empty(&self) -> bool {
        self.parents.is_empty() && self.children.is_empty()
    }

    /// A declaration that parents the document under the hidden root.
    pub fn hidden() -> Self {
        Declaration {
            parents: BTreeSet::from([DocId::hidden_root()]),
            children: BTreeSet::new(),
        }
    }

    /// Every identifier this declaration mentions, either direction.
    pub fn mentioned(&self) -> impl Iterator<Item = &DocId> {
        self.parents.iter().chain(self.children.iter())
    }
}

/// A change observed in the document set, already reduced to index terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentEvent {
    Created(DocId),
    Changed(DocId),
    Deleted(DocId),
    Renamed { from: DocId, to: DocId },
}

impl DocumentEvent {
    /// The document the event is primarily about. For renames, the new id.
    pub fn doc(&self) -> &DocId {
        match self {
            DocumentEvent::Created(id) | DocumentEvent::Changed(id) | DocumentEvent::Deleted(id) => {
                id
            }
            DocumentEvent::Renamed { to, .. } => to,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            DocumentEvent::Created(_) => "created",
            DocumentEvent::Changed(_) => "changed",
            DocumentEvent::Deleted(_) => "deleted",
            DocumentEvent::Renamed { .. } => "renamed",
        }
    }
}

/// Notification emitted by the index service after it has acted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexEvent {
    /// A full rebuild has started; consumers may want to show progress.
    BuildStarted,
    /// The graph changed, incrementally or via a completed rebuild.
    Updated,
    /// The set of detected cycles differs from the last detection.
    CyclesChanged,
}

/// Controls whether the hidden root appears in root listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RootFilter {
    /// Every visible root, hidden root excluded. The default.
    #[default]
    Visible,
    /// All parentless identifiers, hidden root included.
    All,
}
