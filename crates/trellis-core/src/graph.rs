//! Bidirectional parent/child adjacency with a maintained root set

use crate::model::*;
use std::collections::{BTreeSet, HashMap, HashSet};

/// The hierarchy graph. Both edge directions are stored explicitly so
/// parent and child lookups are single map hits; `add_edge`/`remove_edge`
/// are the only places the two maps are touched, which keeps them mirror
/// images of each other.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct HierarchyGraph {
    parent_to_children: HashMap<DocId, BTreeSet<DocId>>,
    child_to_parents: HashMap<DocId, BTreeSet<DocId>>,
    ids: HashSet<DocId>,
    roots: BTreeSet<DocId>,
}

impl std::fmt::Debug for HierarchyGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HierarchyGraph")
            .field("doc_count", &self.ids.len())
            .field("edge_count", &self.edge_count())
            .field("root_count", &self.roots.len())
            .finish()
    }
}

impl HierarchyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track an identifier with no edges yet. Returns false if already known.
    pub fn insert_id(&mut self, id: &DocId) -> bool {
        let added = self.ids.insert(id.clone());
        if added {
            self.recalculate_root_status(id);
        }
        added
    }

    /// Forget an identifier. Callers must remove its edges first.
    pub fn remove_id(&mut self, id: &DocId) -> bool {
        debug_assert_eq!(self.degree(id), 0, "removing identifier with live edges");
        self.parent_to_children.remove(id);
        self.child_to_parents.remove(id);
        self.roots.remove(id);
        self.ids.remove(id)
    }

    /// Add a parent→child edge, updating both directions and the root set.
    /// Self-edges are ignored. Returns true if the edge was new.
    pub fn add_edge(&mut self, parent: &DocId, child: &DocId) -> bool {
        if parent == child {
            return false;
        }
        let forward = self
            .parent_to_children
            .entry(parent.clone())
            .or_default()
            .insert(child.clone());
        let backward = self
            .child_to_parents
            .entry(child.clone())
            .or_default()
            .insert(parent.clone());
        debug_assert_eq!(forward, backward, "adjacency maps diverged");
        if forward {
            self.ids.insert(parent.clone());
            self.ids.insert(child.clone());
            self.recalculate_root_status(parent);
            self.recalculate_root_status(child);
        }
        forward
    }

    /// Remove a parent→child edge from both directions, pruning empty
    /// adjacency sets. Returns true if the edge existed.
    pub fn remove_edge(&mut self, parent: &DocId, child: &DocId) -> bool {
        let forward = self
            .parent_to_children
            .get_mut(parent)
            .map_or(false, |set| set.remove(child));
        let backward = self
            .child_to_parents
            .get_mut(child)
            .map_or(false, |set| set.remove(parent));
        debug_assert_eq!(forward, backward, "adjacency maps diverged");
        if forward {
            if self
                .parent_to_children
                .get(parent)
                .map_or(false, |set| set.is_empty())
            {
                self.parent_to_children.remove(parent);
            }
            if self
                .child_to_parents
                .get(child)
                .map_or(false, |set| set.is_empty())
            {
                self.child_to_parents.remove(child);
            }
            self.recalculate_root_status(parent);
            self.recalculate_root_status(child);
        }
        forward
    }

    pub fn has_edge(&self, parent: &DocId, child: &DocId) -> bool {
        self.parent_to_children
            .get(parent)
            .map_or(false, |set| set.contains(child))
    }

    pub fn contains(&self, id: &DocId) -> bool {
        self.ids.contains(id)
    }

    /// Children of an identifier, in sorted order.
    pub fn children_of(&self, id: &DocId) -> impl Iterator<Item = &DocId> {
        self.parent_to_children.get(id).into_iter().flatten()
    }

    /// Parents of an identifier, in sorted order.
    pub fn parents_of(&self, id: &DocId) -> impl Iterator<Item = &DocId> {
        self.child_to_parents.get(id).into_iter().flatten()
    }

    /// Root identifiers in sorted order, filtered per `filter`.
    pub fn roots(&self, filter: RootFilter) -> impl Iterator<Item = &DocId> {
        self.roots.iter().filter(move |id| match filter {
            RootFilter::Visible => !id.is_hidden_root(),
            RootFilter::All => true,
        })
    }

    pub fn is_root(&self, id: &DocId) -> bool {
        self.roots.contains(id)
    }

    /// Walk upward from `id` taking the first parent at each step, until a
    /// root or an already-visited identifier. Deterministic because parent
    /// sets are ordered. The result starts at `id` and ends at the top.
    pub fn path_to_root(&self, id: &DocId) -> Vec<DocId> {
        let mut path = vec![id.clone()];
        let mut seen = HashSet::from([id.clone()]);
        let mut current = id.clone();
        while let Some(parent) = self
            .child_to_parents
            .get(&current)
            .and_then(|set| set.iter().next())
        {
            if !seen.insert(parent.clone()) {
                break;
            }
            path.push(parent.clone());
            current = parent.clone();
        }
        path
    }

    /// Recompute whether `id` belongs in the root set. An identifier is a
    /// root iff it is tracked and has no parents.
    pub fn recalculate_root_status(&mut self, id: &DocId) {
        if !self.ids.contains(id) {
            self.roots.remove(id);
            return;
        }
        let parentless = self
            .child_to_parents
            .get(id)
            .map_or(true, |set| set.is_empty());
        if parentless {
            self.roots.insert(id.clone());
        } else {
            self.roots.remove(id);
        }
    }

    /// Recompute the whole root set from the adjacency maps.
    pub fn rebuild_roots(&mut self) {
        self.roots = self
            .ids
            .iter()
            .filter(|id| {
                self.child_to_parents
                    .get(*id)
                    .map_or(true, |set| set.is_empty())
            })
            .cloned()
            .collect();
    }

    /// Combined parent and child edge count for an identifier.
    pub fn degree(&self, id: &DocId) -> usize {
        let out = self.parent_to_children.get(id).map_or(0, |set| set.len());
        let inc = self.child_to_parents.get(id).map_or(0, |set| set.len());
        out + inc
    }

    pub fn ids(&self) -> impl Iterator<Item = &DocId> {
        self.ids.iter()
    }

    pub fn doc_count(&self) -> usize {
        self.ids.len()
    }

    pub fn edge_count(&self) -> usize {
        self.parent_to_children.values().map(|set| set.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
