//! Full rebuild: fresh graph and ledger, built aside with cooperative yields

use tracing::info;

use trellis_core::{DocId, HierarchyGraph, RootFilter};

use crate::config::IndexConfig;
use crate::extractor;
use crate::ledger::Ledger;
use crate::metadata::MetadataSnapshot;
use crate::resolver::ResolverBackend;

/// The document set the index is built from. The vault implements this over
/// the filesystem; tests use in-memory fakes. Synchronous because the host
/// keeps its snapshots current ahead of the events it delivers.
pub trait DocumentSource {
    /// Every markdown document currently in the set, unordered.
    fn list_documents(&self) -> Vec<DocId>;

    /// The document's current frontmatter, if it can be read.
    fn metadata(&self, doc: &DocId) -> Option<MetadataSnapshot>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RebuildStats {
    pub documents: usize,
    pub edges: usize,
    /// Visible roots, hidden subtree excluded.
    pub roots: usize,
}

/// Recompute the whole index into fresh structures, yielding between chunks
/// so a large document set does not starve the rest of the runtime.
///
/// Nothing here touches live state: the caller swaps the result in under
/// its write lock, so readers never observe a partially populated graph and
/// an abandoned build leaves the previous state intact.
pub async fn rebuild<S>(source: &S, config: &IndexConfig) -> (HierarchyGraph, Ledger, RebuildStats)
where
    S: DocumentSource + ResolverBackend,
{
    let mut graph = HierarchyGraph::new();
    let mut ledger = Ledger::new();

    let mut documents: Vec<DocId> = source
        .list_documents()
        .into_iter()
        .filter(|doc| !config.is_excluded(doc))
        .collect();
    documents.sort();

    for chunk in documents.chunks(config.chunk_size.max(1)) {
        for doc in chunk {
            graph.insert_id(doc);
            let metadata = source.metadata(doc).unwrap_or_default();
            let declaration = extractor::extract(doc, &metadata, config, source);
            for parent in &declaration.parents {
                graph.add_edge(parent, doc);
            }
            for child in &declaration.children {
                graph.add_edge(doc, child);
            }
            ledger.insert(doc.clone(), declaration);
        }
        tokio::task::yield_now().await;
    }

    graph.rebuild_roots();

    let stats = RebuildStats {
        documents: documents.len(),
        edges: graph.edge_count(),
        roots: graph.roots(RootFilter::Visible).count(),
    };
    info!(
        "rebuild complete: {} documents, {} edges, {} roots",
        stats.documents, stats.edges, stats.roots
    );
    (graph, ledger, stats)
}
