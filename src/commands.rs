//! CLI command implementations

use std::path::PathBuf;
use std::sync::Arc;

use trellis_core::{Cycle, DocId, HierarchyGraph, RootFilter, detect_cycles};
use trellis_indexer::{HierarchyIndex, IndexConfig, rebuild};
use trellis_vault::{Vault, VaultWatcher};

pub async fn index(root: PathBuf) -> anyhow::Result<()> {
    let vault = Vault::open(&root)?;
    let config = IndexConfig::load(vault.root())?;

    let (graph, _, stats) = rebuild(&vault, &config).await;
    tracing::info!(
        "indexed {} documents, {} edges, {} roots",
        stats.documents,
        stats.edges,
        stats.roots
    );

    let cycles = detect_cycles(&graph);
    if !cycles.is_empty() {
        tracing::warn!(
            "{} referencing cycle(s); run `trellis cycles` to list them",
            cycles.len()
        );
    }
    Ok(())
}

pub async fn tree(root: PathBuf, hidden: bool) -> anyhow::Result<()> {
    let vault = Vault::open(&root)?;
    let config = IndexConfig::load(vault.root())?;

    let (graph, _, _) = rebuild(&vault, &config).await;
    print!("{}", render_tree(&graph, hidden));
    Ok(())
}

pub async fn cycles(root: PathBuf) -> anyhow::Result<()> {
    let vault = Vault::open(&root)?;
    let config = IndexConfig::load(vault.root())?;

    let (graph, _, _) = rebuild(&vault, &config).await;
    let cycles = detect_cycles(&graph);
    if cycles.is_empty() {
        println!("no cycles");
        return Ok(());
    }
    for cycle in &cycles {
        println!("{}", format_cycle(cycle));
    }
    Ok(())
}

pub async fn watch(root: PathBuf) -> anyhow::Result<()> {
    let vault = Arc::new(Vault::open(&root)?);
    let config = IndexConfig::load(vault.root())?;

    let (index, worker) = HierarchyIndex::new(Arc::clone(&vault), config);
    tokio::spawn(worker.run());

    // Initial build; everything after arrives through the watcher.
    index.request_rebuild();

    let mut watcher = VaultWatcher::new(vault)?;
    loop {
        tokio::select! {
            event = watcher.recv() => {
                match event {
                    Some(event) => index.send(event),
                    None => {
                        tracing::error!("vault watcher stopped");
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                break;
            }
        }
    }
    Ok(())
}

/// Render the hierarchy as an indented tree, one name per line. Visible
/// roots come first in identifier order; `hidden` appends the hidden
/// subtree. A document with several parents appears under each of them.
fn render_tree(graph: &HierarchyGraph, hidden: bool) -> String {
    let mut out = String::new();
    let mut trail = Vec::new();
    for root in graph.roots(RootFilter::Visible) {
        render_subtree(graph, root, 0, &mut trail, &mut out);
    }
    if hidden {
        let hidden_root = DocId::hidden_root();
        if graph.contains(&hidden_root) {
            render_subtree(graph, &hidden_root, 0, &mut trail, &mut out);
        }
    }
    out
}

fn render_subtree(
    graph: &HierarchyGraph,
    id: &DocId,
    depth: usize,
    trail: &mut Vec<DocId>,
    out: &mut String,
) {
    for _ in 0..depth {
        out.push_str("  ");
    }
    if id.is_hidden_root() {
        out.push_str("(hidden)");
    } else {
        out.push_str(id.name());
    }
    // An ancestor repeating below itself means a cycle; stop descending.
    if trail.contains(id) {
        out.push_str(" (cycle)\n");
        return;
    }
    out.push('\n');
    trail.push(id.clone());
    for child in graph.children_of(id) {
        render_subtree(graph, child, depth + 1, trail, out);
    }
    trail.pop();
}

fn format_cycle(cycle: &Cycle) -> String {
    let mut parts: Vec<&str> = cycle.docs().iter().map(|id| id.as_str()).collect();
    if let Some(first) = parts.first().copied() {
        parts.push(first);
    }
    parts.join(" -> ")
}
