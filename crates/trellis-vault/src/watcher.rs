//! Filesystem watching, mapping notify events onto document events

use std::path::Path;
use std::sync::Arc;

use notify::event::{ModifyKind, RenameMode};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use trellis_core::{DocId, DocumentEvent};

use crate::error::Result;
use crate::vault::Vault;

/// Watches a vault's root recursively, keeps the vault cache in step with
/// the disk, and emits a [`DocumentEvent`] per affected document. Folder
/// renames and deletions fan out to one event per document underneath.
pub struct VaultWatcher {
    // Kept alive for the watcher's lifetime; dropping it stops notify.
    _watcher: RecommendedWatcher,
    event_rx: mpsc::UnboundedReceiver<DocumentEvent>,
}

impl VaultWatcher {
    pub fn new(vault: Arc<Vault>) -> Result<Self> {
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let bridge = Arc::clone(&vault);
        let mut watcher =
            notify::recommended_watcher(move |res: notify::Result<notify::Event>| match res {
                Ok(event) => handle_notify_event(&bridge, event, &event_tx),
                Err(err) => error!("vault watch error: {}", err),
            })?;
        watcher.watch(vault.root(), RecursiveMode::Recursive)?;
        info!("watching {}", vault.root().display());

        Ok(VaultWatcher {
            _watcher: watcher,
            event_rx,
        })
    }

    /// Receive the next document event. `None` once the watcher backend
    /// has shut down.
    pub async fn recv(&mut self) -> Option<DocumentEvent> {
        self.event_rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<DocumentEvent> {
        self.event_rx.try_recv().ok()
    }
}

fn handle_notify_event(
    vault: &Vault,
    event: notify::Event,
    events: &mpsc::UnboundedSender<DocumentEvent>,
) {
    debug!("notify event: {:?} {:?}", event.kind, event.paths);

    match event.kind {
        EventKind::Create(_) => {
            for path in &event.paths {
                if let Some(doc) = vault.doc_id(path) {
                    vault.upsert_document(&doc);
                    forward(events, DocumentEvent::Created(doc));
                } else if path.is_dir() {
                    // A folder moved into the vault carries its documents.
                    ingest_folder(vault, path, events);
                }
            }
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            handle_rename(vault, event.paths.first(), event.paths.get(1), events);
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
            for path in &event.paths {
                handle_disappearance(vault, path, events);
            }
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            for path in &event.paths {
                if let Some(doc) = vault.doc_id(path) {
                    vault.upsert_document(&doc);
                    forward(events, DocumentEvent::Created(doc));
                } else if path.is_dir() {
                    ingest_folder(vault, path, events);
                }
            }
        }
        EventKind::Modify(ModifyKind::Name(_)) => {
            // Some platforms report renames as a bare name change on a
            // single path; probe the disk to tell arrival from departure.
            for path in &event.paths {
                if path.exists() {
                    if let Some(doc) = vault.doc_id(path) {
                        vault.upsert_document(&doc);
                        forward(events, DocumentEvent::Created(doc));
                    } else if path.is_dir() {
                        ingest_folder(vault, path, events);
                    }
                } else {
                    handle_disappearance(vault, path, events);
                }
            }
        }
        EventKind::Modify(_) => {
            for path in &event.paths {
                if let Some(doc) = vault.doc_id(path) {
                    vault.upsert_document(&doc);
                    forward(events, DocumentEvent::Changed(doc));
                }
            }
        }
        EventKind::Remove(_) => {
            for path in &event.paths {
                handle_disappearance(vault, path, events);
            }
        }
        _ => {}
    }
}

fn handle_rename(
    vault: &Vault,
    from: Option<&std::path::PathBuf>,
    to: Option<&std::path::PathBuf>,
    events: &mpsc::UnboundedSender<DocumentEvent>,
) {
    let from_doc = from.and_then(|path| vault.doc_id(path));
    let to_doc = to.and_then(|path| vault.doc_id(path));
    match (from_doc, to_doc) {
        (Some(from), Some(to)) => {
            vault.rename_document(&from, &to);
            forward(events, DocumentEvent::Renamed { from, to });
        }
        // Renamed to something we no longer track (non-md, hidden, outside).
        (Some(from), None) => {
            vault.remove_document(&from);
            forward(events, DocumentEvent::Deleted(from));
        }
        (None, Some(to)) => {
            vault.upsert_document(&to);
            forward(events, DocumentEvent::Created(to));
        }
        (None, None) => {
            if let (Some(from), Some(to)) = (
                from.and_then(|path| vault.relative_path(path)),
                to.and_then(|path| vault.relative_path(path)),
            ) {
                rename_folder(vault, &from, &to, events);
            }
        }
    }
}

fn rename_folder(
    vault: &Vault,
    from: &str,
    to: &str,
    events: &mpsc::UnboundedSender<DocumentEvent>,
) {
    for doc in vault.documents_under(from) {
        let Some(suffix) = doc.as_str().strip_prefix(from) else {
            continue;
        };
        let renamed = DocId::new(format!("{to}{suffix}"));
        vault.rename_document(&doc, &renamed);
        forward(
            events,
            DocumentEvent::Renamed {
                from: doc,
                to: renamed,
            },
        );
    }
}

fn handle_disappearance(
    vault: &Vault,
    path: &Path,
    events: &mpsc::UnboundedSender<DocumentEvent>,
) {
    if let Some(doc) = vault.doc_id(path) {
        vault.remove_document(&doc);
        forward(events, DocumentEvent::Deleted(doc));
        return;
    }
    // A vanished folder takes its documents with it.
    if let Some(folder) = vault.relative_path(path) {
        for doc in vault.documents_under(&folder) {
            vault.remove_document(&doc);
            forward(events, DocumentEvent::Deleted(doc));
        }
    }
}

fn ingest_folder(vault: &Vault, path: &Path, events: &mpsc::UnboundedSender<DocumentEvent>) {
    for doc in vault.scan_tree(path) {
        forward(events, DocumentEvent::Created(doc));
    }
}

fn forward(events: &mpsc::UnboundedSender<DocumentEvent>, event: DocumentEvent) {
    if let Err(err) = events.send(event) {
        warn!("failed to forward document event: {}", err);
    }
}
