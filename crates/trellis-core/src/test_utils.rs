//! Test utilities for Trellis

use crate::graph::HierarchyGraph;
use crate::model::{Declaration, DocId};

/// Shorthand for building a DocId in tests.
pub fn doc(path: &str) -> DocId {
    DocId::new(path)
}

/// Build a graph from parent→child edge pairs.
pub fn graph_from_edges(edges: &[(&str, &str)]) -> HierarchyGraph {
    let mut graph = HierarchyGraph::new();
    for (parent, child) in edges {
        graph.add_edge(&doc(parent), &doc(child));
    }
    graph
}

/// Build a declaration from parent and child identifier lists.
pub fn declaration(parents: &[&str], children: &[&str]) -> Declaration {
    Declaration {
        parents: parents.iter().map(|p| doc(p)).collect(),
        children: children.iter().map(|c| doc(c)).collect(),
    }
}

/// Assert the two adjacency directions describe the same edge set.
pub fn assert_symmetric(graph: &HierarchyGraph) {
    for id in graph.ids() {
        for child in graph.children_of(id) {
            assert!(
                graph.parents_of(child).any(|p| p == id),
                "edge {id} -> {child} missing reverse entry"
            );
        }
        for parent in graph.parents_of(id) {
            assert!(
                graph.children_of(parent).any(|c| c == id),
                "edge {parent} -> {id} missing forward entry"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_from_edges_builds_all_endpoints() {
        let graph = graph_from_edges(&[("A.md", "B.md"), ("B.md", "C.md")]);
        assert_eq!(graph.doc_count(), 3);
        assert_eq!(graph.edge_count(), 2);
        assert_symmetric(&graph);
    }
}
