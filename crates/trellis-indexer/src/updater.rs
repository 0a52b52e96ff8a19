//! Incremental reconciliation of single-document changes
//!
//! Pure functions over the graph and ledger so the ordering contract is
//! directly unit-testable. The contract: the ledger entry is written BEFORE
//! old edges are diffed away, so that removal checks observe the new state
//! of "does the other side still assert this". Reordering those two steps
//! breaks joint assertion, where two documents hold the same edge alive.

use tracing::debug;

use trellis_core::{Declaration, DocId, HierarchyGraph};

use crate::ledger::Ledger;

/// Replace `doc`'s declaration and apply the minimal edge changes. Returns
/// true when the graph actually changed.
pub fn apply_declaration(
    graph: &mut HierarchyGraph,
    ledger: &mut Ledger,
    doc: &DocId,
    new: Declaration,
) -> bool {
    let old = ledger.declaration(doc);
    ledger.insert(doc.clone(), new.clone());

    // The document itself is tracked even when it declares nothing.
    let mut changed = graph.insert_id(doc);

    for parent in old.parents.difference(&new.parents) {
        changed |= remove_edge_if_unreferenced(graph, ledger, parent, doc);
    }
    for child in old.children.difference(&new.children) {
        changed |= remove_edge_if_unreferenced(graph, ledger, doc, child);
    }
    for parent in &new.parents {
        changed |= graph.add_edge(parent, doc);
    }
    for child in &new.children {
        changed |= graph.add_edge(doc, child);
    }

    if changed {
        debug!(
            "reconciled {}: {} parent(s), {} child(ren)",
            doc,
            new.parents.len(),
            new.children.len()
        );
    }
    changed
}

/// Remove the edge (parent, child) only when neither endpoint's current
/// ledger entry still asserts it. Returns true if the edge was removed.
pub fn remove_edge_if_unreferenced(
    graph: &mut HierarchyGraph,
    ledger: &Ledger,
    parent: &DocId,
    child: &DocId,
) -> bool {
    if ledger.declares_child(parent, child) || ledger.declares_parent(child, parent) {
        return false;
    }
    graph.remove_edge(parent, child)
}

/// Drop `doc`'s record and retract the edges it alone asserted. The
/// identifier is evicted only once no edge touches it; a dangling id that
/// other documents still point at stays tracked.
pub fn remove_document(graph: &mut HierarchyGraph, ledger: &mut Ledger, doc: &DocId) -> bool {
    let old = ledger.remove(doc).unwrap_or_default();
    let mut changed = false;

    for parent in &old.parents {
        changed |= remove_edge_if_unreferenced(graph, ledger, parent, doc);
    }
    for child in &old.children {
        changed |= remove_edge_if_unreferenced(graph, ledger, doc, child);
    }
    if graph.contains(doc) && graph.degree(doc) == 0 && graph.remove_id(doc) {
        changed = true;
    }

    if changed {
        debug!("removed {} from the index", doc);
    }
    changed
}
