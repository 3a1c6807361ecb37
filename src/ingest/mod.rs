//! Content ingestion module for huddle.
//!
//! Fetches heterogeneous feeds (article RSS, video channels, podcasts),
//! extracts metadata, classifies items against the tag dictionary, and
//! persists deduplicated content.

pub mod extract;
pub mod fetcher;
pub mod gateway;
pub mod orchestrator;
pub mod repository;
pub mod scheduler;
pub mod seed;
pub mod tags;
pub mod types;

pub use extract::{extract, strip_html};
pub use fetcher::{parse_feed, validate_url, FeedFetcher, FeedSource};
pub use gateway::{ContentGateway, PersistOutcome};
pub use orchestrator::{SourceIngestor, SourceReport};
pub use repository::{ContentRepository, SourceRepository, TagRepository};
pub use scheduler::{start_gap_check, start_scheduler, BatchSummary, IngestScheduler};
pub use seed::{apply_seed, apply_seed_file, SeedFile, SeedReport};
pub use tags::{TagDictionary, TagMatcher};
pub use types::{
    Content, ContentKind, Enclosure, NewContent, NewSource, NewTag, NormalizedItem, RawItem,
    Source, SourceKind, Tag, TagType, DEFAULT_STALE_AFTER_SECS, MAX_DESCRIPTION_LENGTH,
    MAX_ERROR_LENGTH, MAX_FEED_SIZE, MAX_ITEMS_PER_FEED, UNTITLED_PLACEHOLDER,
};
