//! Provenance ledger: which document currently asserts which edges
//!
//! An edge (parent, child) exists because the child declared the parent, the
//! parent declared the child, or both. Removal is only legal once neither
//! side asserts it any more, and the ledger is what answers that question.

use std::collections::HashMap;

use trellis_core::{Declaration, DocId};

#[derive(Debug, Clone, Default)]
pub struct Ledger {
    records: HashMap<DocId, Declaration>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, doc: &DocId) -> Option<&Declaration> {
        self.records.get(doc)
    }

    /// Owned copy of a document's declaration, empty when unrecorded.
    pub fn declaration(&self, doc: &DocId) -> Declaration {
        self.records.get(doc).cloned().unwrap_or_default()
    }

    pub fn insert(&mut self, doc: DocId, declaration: Declaration) {
        self.records.insert(doc, declaration);
    }

    pub fn remove(&mut self, doc: &DocId) -> Option<Declaration> {
        self.records.remove(doc)
    }

    /// Does `parent`'s current record assert `child` as its child?
    pub fn declares_child(&self, parent: &DocId, child: &DocId) -> bool {
        self.records
            .get(parent)
            .map_or(false, |decl| decl.children.contains(child))
    }

    /// Does `child`'s current record assert `parent` as its parent?
    pub fn declares_parent(&self, child: &DocId, parent: &DocId) -> bool {
        self.records
            .get(child)
            .map_or(false, |decl| decl.parents.contains(parent))
    }

    pub fn docs(&self) -> impl Iterator<Item = &DocId> {
        self.records.keys()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
