//! Integration tests for Trellis
//!
//! These tests drive the whole stack: a vault on disk, the index service,
//! and the CLI binary.

use std::fs;
use std::path::Path;
use std::process::Command;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::broadcast;
use trellis_core::{DocId, DocumentEvent, IndexEvent, RootFilter};
use trellis_indexer::{DocumentSource, HierarchyIndex, IndexConfig};
use trellis_vault::{Vault, VaultWatcher};

fn write_doc(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn doc(path: &str) -> DocId {
    DocId::new(path)
}

/// Spin up the index service over a freshly opened vault and wait for the
/// first build to land.
async fn open_index(root: &Path) -> (Arc<Vault>, HierarchyIndex, broadcast::Receiver<IndexEvent>) {
    let vault = Arc::new(Vault::open(root).unwrap());
    let config = IndexConfig::load(vault.root()).unwrap();
    let (index, worker) = HierarchyIndex::new(Arc::clone(&vault), config);
    tokio::spawn(worker.run());

    let mut events = index.subscribe();
    index.request_rebuild();
    wait_for(&mut events, IndexEvent::Updated).await;
    (vault, index, events)
}

async fn wait_for(rx: &mut broadcast::Receiver<IndexEvent>, wanted: IndexEvent) {
    loop {
        match tokio::time::timeout(Duration::from_secs(10), rx.recv()).await {
            Ok(Ok(event)) if event == wanted => return,
            Ok(Ok(_)) => continue,
            Ok(Err(err)) => panic!("event channel closed: {err}"),
            Err(_) => panic!("timed out waiting for {wanted:?}"),
        }
    }
}

/// Test that the CLI can be invoked
#[tokio::test]
async fn test_cli_invocation() {
    let output = Command::new("cargo")
        .args(["run", "--", "--help"])
        .current_dir(".")
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("trellis"));
    assert!(stdout.contains("Live parent/child hierarchy index"));
}

/// Test one-shot tree rendering through the CLI
#[tokio::test]
async fn test_cli_renders_tree() {
    let dir = TempDir::new().unwrap();
    write_doc(dir.path(), "Top.md", "---\nchildren:\n  - \"[[Child]]\"\n---\n");
    write_doc(
        dir.path(),
        "Child.md",
        "---\nparent: \"[[Top]]\"\nchildren: Grandchild\n---\n",
    );
    write_doc(dir.path(), "Grandchild.md", "");
    write_doc(dir.path(), "Loose.md", "");

    let output = Command::new("cargo")
        .args(["run", "--", "--root"])
        .arg(dir.path())
        .arg("tree")
        .current_dir(".")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    insta::assert_snapshot!(stdout, @r"
    Loose
    Top
      Child
        Grandchild
    ");
}

/// Test cycle listing through the CLI
#[tokio::test]
async fn test_cli_lists_cycles() {
    let dir = TempDir::new().unwrap();
    write_doc(dir.path(), "A.md", "---\nparent: B\n---\n");
    write_doc(dir.path(), "B.md", "---\nparent: A\n---\n");

    let output = Command::new("cargo")
        .args(["run", "--", "--root"])
        .arg(dir.path())
        .arg("cycles")
        .current_dir(".")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), "A.md -> B.md -> A.md");
}

/// Test that the service follows vault changes document by document
#[tokio::test]
async fn test_live_index_follows_vault_changes() {
    let dir = TempDir::new().unwrap();
    write_doc(dir.path(), ".trellis.toml", "debounce_ms = 25\n");
    write_doc(dir.path(), "Top.md", "");
    write_doc(dir.path(), "Child.md", "---\nparent: \"[[Top]]\"\n---\n");

    let (vault, index, mut events) = open_index(dir.path()).await;
    assert_eq!(index.roots(RootFilter::Visible).await, vec![doc("Top.md")]);
    assert_eq!(
        index.children_of(&doc("Top.md")).await,
        vec![doc("Child.md")]
    );
    assert_eq!(
        index.path_to_root(&doc("Child.md")).await,
        vec![doc("Child.md"), doc("Top.md")]
    );

    // A new document appears and claims Top as its parent.
    write_doc(vault.root(), "Sibling.md", "---\nparent: Top\n---\n");
    vault.upsert_document(&doc("Sibling.md"));
    index.send(DocumentEvent::Created(doc("Sibling.md")));
    wait_for(&mut events, IndexEvent::Updated).await;

    assert_eq!(
        index.children_of(&doc("Top.md")).await,
        vec![doc("Child.md"), doc("Sibling.md")]
    );

    // Renames go through a full rebuild.
    fs::rename(
        vault.root().join("Sibling.md"),
        vault.root().join("Cousin.md"),
    )
    .unwrap();
    vault.rename_document(&doc("Sibling.md"), &doc("Cousin.md"));
    index.send(DocumentEvent::Renamed {
        from: doc("Sibling.md"),
        to: doc("Cousin.md"),
    });
    wait_for(&mut events, IndexEvent::BuildStarted).await;
    wait_for(&mut events, IndexEvent::Updated).await;

    assert_eq!(
        index.children_of(&doc("Top.md")).await,
        vec![doc("Child.md"), doc("Cousin.md")]
    );
    assert!(!index.contains(&doc("Sibling.md")).await);
}

/// Test that the filesystem watcher feeds the service on its own
#[tokio::test]
async fn test_watcher_drives_the_index() {
    let dir = TempDir::new().unwrap();
    write_doc(dir.path(), ".trellis.toml", "debounce_ms = 25\n");
    write_doc(dir.path(), "Top.md", "");

    let (vault, index, mut events) = open_index(dir.path()).await;
    let mut watcher = VaultWatcher::new(Arc::clone(&vault)).unwrap();
    let feeder = index.clone();
    tokio::spawn(async move {
        while let Some(event) = watcher.recv().await {
            feeder.send(event);
        }
    });

    write_doc(vault.root(), "Fresh.md", "---\nparent: Top\n---\n");
    wait_for(&mut events, IndexEvent::Updated).await;

    assert_eq!(
        index.children_of(&doc("Top.md")).await,
        vec![doc("Fresh.md")]
    );
}

/// Test cycle detection and notification end to end
#[tokio::test]
async fn test_cycles_are_reported_and_cleared() {
    let dir = TempDir::new().unwrap();
    write_doc(dir.path(), ".trellis.toml", "debounce_ms = 25\n");
    write_doc(dir.path(), "A.md", "---\nparent: B\n---\n");
    write_doc(dir.path(), "B.md", "---\nparent: A\n---\n");

    let (vault, index, mut events) = open_index(dir.path()).await;
    // The initial build announces the cycle; drain that notification so the
    // next one observed really is the clearing.
    wait_for(&mut events, IndexEvent::CyclesChanged).await;
    let cycles = index.cycles().await;
    assert_eq!(cycles.len(), 1);
    assert_eq!(cycles[0].docs(), &[doc("A.md"), doc("B.md")]);

    // Breaking the loop clears the report.
    write_doc(vault.root(), "B.md", "");
    vault.upsert_document(&doc("B.md"));
    index.send(DocumentEvent::Changed(doc("B.md")));
    wait_for(&mut events, IndexEvent::CyclesChanged).await;
    assert!(index.cycles().await.is_empty());
}

/// Test that configured exclusions keep documents out of the index
#[tokio::test]
async fn test_excluded_paths_stay_out_of_the_index() {
    let dir = TempDir::new().unwrap();
    write_doc(
        dir.path(),
        ".trellis.toml",
        "debounce_ms = 25\nexcluded_paths = [\"Archive\"]\n",
    );
    write_doc(dir.path(), "Top.md", "---\nchildren: Kept\n---\n");
    write_doc(dir.path(), "Kept.md", "");
    write_doc(dir.path(), "Archive/Old.md", "---\nparent: Top\n---\n");

    let (vault, index, _events) = open_index(dir.path()).await;
    assert!(!index.contains(&doc("Archive/Old.md")).await);
    assert_eq!(index.children_of(&doc("Top.md")).await, vec![doc("Kept.md")]);

    // The vault still caches the excluded document, so re-including it
    // later needs no rescan.
    assert_eq!(
        vault
            .metadata(&doc("Archive/Old.md"))
            .unwrap()
            .strings("parent"),
        vec!["Top"]
    );
}

/// Test the hidden marker end to end
#[tokio::test]
async fn test_hidden_documents_leave_visible_roots() {
    let dir = TempDir::new().unwrap();
    write_doc(dir.path(), ".trellis.toml", "debounce_ms = 25\n");
    write_doc(dir.path(), "Secret.md", "---\nparent: hidden\n---\n");
    write_doc(dir.path(), "Plain.md", "");

    let (_vault, index, _events) = open_index(dir.path()).await;
    assert_eq!(index.roots(RootFilter::Visible).await, vec![doc("Plain.md")]);
    assert_eq!(
        index.roots(RootFilter::All).await,
        vec![doc("Plain.md"), DocId::hidden_root()]
    );
    assert_eq!(
        index.parents_of(&doc("Secret.md")).await,
        vec![DocId::hidden_root()]
    );
}
