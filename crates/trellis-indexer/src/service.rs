//! The index service: shared state, worker loop, notifications
//!
//! One worker task owns every mutation; readers query through the handle
//! under a read lock. Full rebuilds run as spawned tasks that build aside
//! and message their result back, so the worker never blocks on a large
//! vault and readers never see a half-built graph.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{RwLock, broadcast, mpsc};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use trellis_core::{
    Cycle, CycleTracker, DocId, DocumentEvent, HierarchyGraph, IndexEvent, RootFilter,
    detect_cycles,
};

use crate::config::IndexConfig;
use crate::extractor;
use crate::ledger::Ledger;
use crate::rebuilder::{self, DocumentSource, RebuildStats};
use crate::resolver::ResolverBackend;
use crate::scheduler::{Finish, RebuildScheduler, Request};
use crate::updater;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Everything readers see. Replaced wholesale when a full rebuild lands.
#[derive(Debug, Default)]
struct IndexState {
    graph: HierarchyGraph,
    ledger: Ledger,
    cycles: Vec<Cycle>,
}

/// Commands accepted by the worker.
#[derive(Debug)]
pub enum IndexCommand {
    /// A document changed; reconcile incrementally (or fold into a running
    /// rebuild).
    Document(DocumentEvent),
    /// Request a full rebuild, debounced.
    Rebuild,
    /// Swap the configuration; implies a full rebuild.
    UpdateConfig(IndexConfig),
}

/// A finished build waiting to be swapped in.
struct Built {
    graph: HierarchyGraph,
    ledger: Ledger,
    stats: RebuildStats,
}

/// Cloneable handle to the index: queries under the read lock, commands to
/// the worker, notification subscription.
#[derive(Clone)]
pub struct HierarchyIndex {
    state: Arc<RwLock<IndexState>>,
    commands: mpsc::UnboundedSender<IndexCommand>,
    events: broadcast::Sender<IndexEvent>,
}

impl HierarchyIndex {
    /// Create the service around a document source. The returned worker must
    /// be spawned for the index to process anything.
    pub fn new<S>(source: Arc<S>, config: IndexConfig) -> (Self, IndexWorker<S>)
    where
        S: DocumentSource + ResolverBackend + Send + Sync + 'static,
    {
        let state = Arc::new(RwLock::new(IndexState::default()));
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (built_tx, built_rx) = mpsc::unbounded_channel();

        let handle = HierarchyIndex {
            state: state.clone(),
            commands,
            events: events.clone(),
        };
        let worker = IndexWorker {
            state,
            events,
            source,
            config,
            scheduler: RebuildScheduler::new(),
            tracker: CycleTracker::new(),
            command_rx,
            built_tx,
            built_rx,
            deadline: None,
        };
        (handle, worker)
    }

    /// Deliver a document event for reconciliation.
    pub fn send(&self, event: DocumentEvent) {
        let _ = self.commands.send(IndexCommand::Document(event));
    }

    /// Ask for a full rebuild (debounced, coalesced with any in flight).
    pub fn request_rebuild(&self) {
        let _ = self.commands.send(IndexCommand::Rebuild);
    }

    /// Swap the configuration. Prior ledger entries are keyed to the old
    /// property names, so this always triggers a full rebuild.
    pub fn update_config(&self, config: IndexConfig) {
        let _ = self.commands.send(IndexCommand::UpdateConfig(config));
    }

    pub fn subscribe(&self) -> broadcast::Receiver<IndexEvent> {
        self.events.subscribe()
    }

    pub async fn children_of(&self, id: &DocId) -> Vec<DocId> {
        self.state.read().await.graph.children_of(id).cloned().collect()
    }

    pub async fn parents_of(&self, id: &DocId) -> Vec<DocId> {
        self.state.read().await.graph.parents_of(id).cloned().collect()
    }

    pub async fn roots(&self, filter: RootFilter) -> Vec<DocId> {
        self.state.read().await.graph.roots(filter).cloned().collect()
    }

    pub async fn path_to_root(&self, id: &DocId) -> Vec<DocId> {
        self.state.read().await.graph.path_to_root(id)
    }

    pub async fn cycles(&self) -> Vec<Cycle> {
        self.state.read().await.cycles.clone()
    }

    pub async fn contains(&self, id: &DocId) -> bool {
        self.state.read().await.graph.contains(id)
    }

    pub async fn doc_count(&self) -> usize {
        self.state.read().await.graph.doc_count()
    }

    pub async fn edge_count(&self) -> usize {
        self.state.read().await.graph.edge_count()
    }

    /// Coherent clone of the whole graph, for rendering and inspection.
    pub async fn graph_snapshot(&self) -> HierarchyGraph {
        self.state.read().await.graph.clone()
    }
}

/// Single owner of all index mutation. Runs until every handle is dropped.
pub struct IndexWorker<S> {
    state: Arc<RwLock<IndexState>>,
    events: broadcast::Sender<IndexEvent>,
    source: Arc<S>,
    config: IndexConfig,
    scheduler: RebuildScheduler,
    tracker: CycleTracker,
    command_rx: mpsc::UnboundedReceiver<IndexCommand>,
    built_tx: mpsc::UnboundedSender<Built>,
    built_rx: mpsc::UnboundedReceiver<Built>,
    deadline: Option<Instant>,
}

impl<S> IndexWorker<S>
where
    S: DocumentSource + ResolverBackend + Send + Sync + 'static,
{
    pub async fn run(mut self) {
        info!("index worker started");
        loop {
            let deadline = self.deadline;
            tokio::select! {
                command = self.command_rx.recv() => {
                    match command {
                        Some(IndexCommand::Document(event)) => self.handle_document(event).await,
                        Some(IndexCommand::Rebuild) => self.schedule_rebuild(),
                        Some(IndexCommand::UpdateConfig(config)) => {
                            info!("configuration updated; scheduling full rebuild");
                            self.config = config;
                            self.schedule_rebuild();
                        }
                        None => break,
                    }
                }
                Some(built) = self.built_rx.recv() => {
                    self.finish_rebuild(built).await;
                }
                _ = sleep_until_deadline(deadline) => {
                    self.deadline = None;
                    match self.scheduler.request() {
                        Request::Start => self.spawn_rebuild(),
                        Request::Coalesced => {
                            debug!("rebuild already running; follow-up queued");
                        }
                    }
                }
            }
        }
        info!("index worker stopped");
    }

    /// Arm (or push out) the trailing-edge debounce timer.
    fn schedule_rebuild(&mut self) {
        let window = Duration::from_millis(self.config.debounce_ms);
        self.deadline = Some(Instant::now() + window);
    }

    fn spawn_rebuild(&self) {
        let _ = self.events.send(IndexEvent::BuildStarted);
        let source = self.source.clone();
        let config = self.config.clone();
        let built_tx = self.built_tx.clone();
        tokio::spawn(async move {
            let (graph, ledger, stats) = rebuilder::rebuild(source.as_ref(), &config).await;
            let _ = built_tx.send(Built { graph, ledger, stats });
        });
    }

    async fn finish_rebuild(&mut self, built: Built) {
        let cycles = detect_cycles(&built.graph);
        let cycle_count = cycles.len();
        let cycles_changed = self.tracker.update(&cycles);
        {
            let mut state = self.state.write().await;
            state.graph = built.graph;
            state.ledger = built.ledger;
            state.cycles = cycles;
        }
        info!(
            "index rebuilt: {} documents, {} edges, {} roots",
            built.stats.documents, built.stats.edges, built.stats.roots
        );

        let _ = self.events.send(IndexEvent::Updated);
        if cycles_changed {
            if cycle_count > 0 {
                warn!("hierarchy contains {} cycle(s)", cycle_count);
            } else {
                info!("hierarchy cycles resolved");
            }
            let _ = self.events.send(IndexEvent::CyclesChanged);
        }

        if self.scheduler.finish() == Finish::RunAgain {
            debug!("starting queued rebuild");
            self.spawn_rebuild();
        }
    }

    async fn handle_document(&mut self, event: DocumentEvent) {
        debug!("document {}: {}", event.kind(), event.doc());

        if self.scheduler.is_building() {
            // The state is about to be replaced; fold this into the
            // follow-up rebuild instead of mutating a doomed graph.
            self.scheduler.request();
            return;
        }

        match event {
            DocumentEvent::Created(doc) | DocumentEvent::Changed(doc) => {
                if self.config.is_excluded(&doc) {
                    return;
                }
                let metadata = self.source.metadata(&doc).unwrap_or_default();
                let declaration =
                    extractor::extract(&doc, &metadata, &self.config, self.source.as_ref());
                self.mutate(|graph, ledger| {
                    updater::apply_declaration(graph, ledger, &doc, declaration)
                })
                .await;
            }
            DocumentEvent::Deleted(doc) => {
                self.mutate(|graph, ledger| updater::remove_document(graph, ledger, &doc))
                    .await;
            }
            DocumentEvent::Renamed { from, .. } => {
                // The old record drops now; re-resolving every textual link
                // that may have pointed at the old name is global work, so
                // the new state comes from a full rebuild.
                self.mutate(|graph, ledger| updater::remove_document(graph, ledger, &from))
                    .await;
                self.schedule_rebuild();
            }
        }
    }

    /// Run one mutation under the write lock, then re-scan cycles and emit
    /// notifications when anything changed.
    async fn mutate<F>(&mut self, op: F)
    where
        F: FnOnce(&mut HierarchyGraph, &mut Ledger) -> bool,
    {
        let cycles_changed;
        {
            let mut guard = self.state.write().await;
            let state = &mut *guard;
            let changed = op(&mut state.graph, &mut state.ledger);
            if !changed {
                return;
            }
            let cycles = detect_cycles(&state.graph);
            cycles_changed = self.tracker.update(&cycles);
            state.cycles = cycles;
        }

        let _ = self.events.send(IndexEvent::Updated);
        if cycles_changed {
            let _ = self.events.send(IndexEvent::CyclesChanged);
        }
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
