//! Cycle detection over the hierarchy graph
//!
//! Parent/child declarations come from user-authored documents, so loops are
//! a normal input, not a corruption. Detection runs after every full rebuild;
//! the tracker decides whether the set actually changed since last time.

use crate::graph::HierarchyGraph;
use crate::model::DocId;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::hash::{DefaultHasher, Hash, Hasher};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// One detected cycle in canonical form: rotated so the smallest identifier
/// comes first. Two discoveries of the same loop from different entry points
/// compare equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cycle(Vec<DocId>);

impl Cycle {
    pub fn new(mut ids: Vec<DocId>) -> Self {
        let min_pos = ids
            .iter()
            .enumerate()
            .min_by_key(|(_, id)| *id)
            .map(|(pos, _)| pos);
        if let Some(pos) = min_pos {
            ids.rotate_left(pos);
        }
        Cycle(ids)
    }

    /// The documents on the cycle, starting at the smallest identifier.
    /// The closing hop back to the first entry is implied.
    pub fn docs(&self) -> &[DocId] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, id: &DocId) -> bool {
        self.0.iter().any(|member| member == id)
    }
}

impl fmt::Display for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, id) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str(" -> ")?;
            }
            f.write_str(id.as_str())?;
        }
        if let Some(first) = self.0.first() {
            write!(f, " -> {first}")?;
        }
        Ok(())
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    Unvisited,
    OnPath,
    Finished,
}

struct Frame<'a> {
    node: &'a DocId,
    children: Vec<&'a DocId>,
    next: usize,
}

impl<'a> Frame<'a> {
    fn new(node: &'a DocId, graph: &'a HierarchyGraph) -> Self {
        Frame {
            node,
            children: graph.children_of(node).collect(),
            next: 0,
        }
    }
}

/// Find every directed cycle reachable through parent→child edges.
///
/// Depth-first with an explicit frame stack, so arbitrarily deep
/// hierarchies cannot overflow the call stack. When a child already on the
/// current path is reached, the path suffix from that child is one cycle.
/// Results are deduplicated in canonical form and returned sorted.
pub fn detect_cycles(graph: &HierarchyGraph) -> Vec<Cycle> {
    let mut state: HashMap<&DocId, Visit> =
        graph.ids().map(|id| (id, Visit::Unvisited)).collect();
    let mut found: BTreeSet<Cycle> = BTreeSet::new();

    for start in graph.ids() {
        if state.get(start).copied() != Some(Visit::Unvisited) {
            continue;
        }
        let mut path: Vec<&DocId> = vec![start];
        let mut stack = vec![Frame::new(start, graph)];
        state.insert(start, Visit::OnPath);

        loop {
            let Some(frame) = stack.last_mut() else { break };
            if frame.next >= frame.children.len() {
                state.insert(frame.node, Visit::Finished);
                path.pop();
                stack.pop();
                continue;
            }
            let child = frame.children[frame.next];
            frame.next += 1;
            match state.get(child).copied().unwrap_or(Visit::Finished) {
                Visit::Unvisited => {
                    state.insert(child, Visit::OnPath);
                    path.push(child);
                    stack.push(Frame::new(child, graph));
                }
                Visit::OnPath => {
                    if let Some(pos) = path.iter().position(|id| *id == child) {
                        let ids = path[pos..].iter().map(|id| (*id).clone()).collect();
                        found.insert(Cycle::new(ids));
                    }
                }
                Visit::Finished => {}
            }
        }
    }

    if !found.is_empty() {
        debug!("detected {} cycle(s)", found.len());
    }
    found.into_iter().collect()
}

/// Remembers the signature of the last detected cycle set so callers can
/// notify only when the set actually changes.
#[derive(Debug)]
pub struct CycleTracker {
    signature: u64,
}

impl CycleTracker {
    pub fn new() -> Self {
        CycleTracker {
            signature: signature_of(&[]),
        }
    }

    /// Record the latest detection result. Returns true if it differs from
    /// the previous one. Expects the sorted output of [`detect_cycles`].
    pub fn update(&mut self, cycles: &[Cycle]) -> bool {
        let signature = signature_of(cycles);
        let changed = signature != self.signature;
        self.signature = signature;
        changed
    }
}

impl Default for CycleTracker {
    fn default() -> Self {
        Self::new()
    }
}

fn signature_of(cycles: &[Cycle]) -> u64 {
    let mut hasher = DefaultHasher::new();
    cycles.len().hash(&mut hasher);
    for cycle in cycles {
        for id in cycle.docs() {
            id.as_str().hash(&mut hasher);
        }
        u8::MAX.hash(&mut hasher);
    }
    hasher.finish()
}
