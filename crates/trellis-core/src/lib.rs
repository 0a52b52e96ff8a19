//! Trellis Core — hierarchy data model, bidirectional graph, and cycle detection

pub mod cycles;
pub mod graph;
pub mod model;


#[cfg(test)]
pub mod test_utils;

pub use cycles::{Cycle, CycleTracker, detect_cycles};
pub use graph::HierarchyGraph;
pub use model::{Declaration, DocId, DocumentEvent, HIDDEN_ROOT, IndexEvent, RootFilter};
