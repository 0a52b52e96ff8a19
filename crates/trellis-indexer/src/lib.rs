//! Trellis Indexer — declaration extraction, provenance tracking, and
//! incremental/full index builds

pub mod config;
pub mod extractor;
pub mod ledger;
pub mod metadata;
pub mod rebuilder;
pub mod resolver;
pub mod scheduler;
pub mod service;
pub mod updater;


pub use config::{CONFIG_FILE, IndexConfig};
pub use metadata::MetadataSnapshot;
pub use rebuilder::{DocumentSource, RebuildStats, rebuild};
pub use resolver::ResolverBackend;
pub use service::{HierarchyIndex, IndexCommand, IndexWorker};
