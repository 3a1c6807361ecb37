//! huddle - Fantasy Football Content Aggregator
//!
//! Ingestion core: polls configured sources (RSS articles, video channels,
//! podcast feeds), normalizes and tags their items, and persists a
//! deduplicated content corpus.

pub mod config;
pub mod db;
pub mod error;
pub mod ingest;
pub mod logging;

pub use config::Config;
pub use db::Database;
pub use error::{HuddleError, Result};
pub use ingest::{
    BatchSummary, Content, ContentKind, FeedFetcher, IngestScheduler, Source, SourceIngestor,
    SourceKind, Tag, TagMatcher, TagType,
};
