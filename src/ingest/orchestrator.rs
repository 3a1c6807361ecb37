//! Per-source ingestion orchestration for huddle.
//!
//! Drives one source end-to-end (fetch, extract, tag, persist), updates the
//! source's health fields, and isolates failures per item and per source.

use tracing::{debug, warn};

use crate::error::{HuddleError, Result};
use crate::ingest::extract::extract;
use crate::ingest::fetcher::FeedSource;
use crate::ingest::gateway::{ContentGateway, PersistOutcome};
use crate::ingest::repository::{ContentRepository, SourceRepository};
use crate::ingest::tags::TagMatcher;
use crate::Database;

/// Per-source ingestion outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceReport {
    /// Newly created content rows.
    pub created: usize,
    /// Items skipped because their canonical URL was already ingested.
    pub skipped: usize,
    /// Items dropped by extraction or per-item persistence failures.
    pub item_errors: usize,
}

/// Drives ingestion for a single source.
pub struct SourceIngestor<'a> {
    db: &'a Database,
    fetcher: &'a (dyn FeedSource + Send + Sync),
    matcher: &'a TagMatcher,
    max_items: usize,
}

impl<'a> SourceIngestor<'a> {
    /// Create a new ingestor over explicitly constructed collaborators.
    pub fn new(
        db: &'a Database,
        fetcher: &'a (dyn FeedSource + Send + Sync),
        matcher: &'a TagMatcher,
        max_items: usize,
    ) -> Self {
        Self {
            db,
            fetcher,
            matcher,
            max_items,
        }
    }

    /// Ingest one source by ID.
    ///
    /// Fetch-level failures are recorded on the source (attempt timestamp,
    /// truncated error, bumped error count) and re-raised so the batch
    /// tally can count them. Item-level failures are logged, counted and
    /// never abort the remaining items. A successful cycle clears the
    /// source's error state.
    pub async fn ingest_source(&self, source_id: i64) -> Result<SourceReport> {
        let sources = SourceRepository::new(self.db.pool());
        let source = sources
            .get_by_id(source_id)
            .await?
            .ok_or_else(|| HuddleError::NotFound("source".into()))?;

        // Using the dictionary before it is loaded is an initialization bug;
        // fail before touching the network rather than under-tagging.
        let dictionary = self.matcher.current()?;

        debug!(source = %source.name, url = %source.feed_url, "fetching feed");

        let items = match self.fetcher.fetch(&source.feed_url).await {
            Ok(items) => items,
            Err(e) => {
                warn!(source = %source.name, error = %e, "feed fetch failed");
                sources.record_fetch_failure(source.id, &e.to_string()).await?;
                return Err(e);
            }
        };

        if items.is_empty() {
            let previously_seen = ContentRepository::new(self.db.pool())
                .count_by_source(source.id)
                .await?
                > 0;
            if previously_seen {
                // A feed that had items and suddenly has none usually means
                // upstream broke, not that content disappeared.
                let message = "feed returned no items";
                warn!(source = %source.name, message);
                sources.record_fetch_failure(source.id, message).await?;
                return Err(HuddleError::Fetch(message.to_string()));
            }
            sources.record_ingest_success(source.id).await?;
            return Ok(SourceReport::default());
        }

        let gateway = ContentGateway::new(self.db.pool());
        let mut report = SourceReport::default();

        for item in items.iter().take(self.max_items) {
            let Some(normalized) = extract(item, source.kind) else {
                debug!(source = %source.name, "item has no link or guid, skipping");
                report.item_errors += 1;
                continue;
            };

            let tag_ids = dictionary.match_tags(
                &normalized.title,
                normalized.description.as_deref().unwrap_or(""),
            );

            match gateway.persist(source.id, &normalized, &tag_ids).await {
                Ok(PersistOutcome::Created(_)) => report.created += 1,
                Ok(PersistOutcome::Skipped) => report.skipped += 1,
                Err(e) => {
                    warn!(
                        source = %source.name,
                        canonical_url = %normalized.canonical_url,
                        error = %e,
                        "failed to persist item"
                    );
                    report.item_errors += 1;
                }
            }
        }

        sources.record_ingest_success(source.id).await?;

        debug!(
            source = %source.name,
            created = report.created,
            skipped = report.skipped,
            item_errors = report.item_errors,
            "source ingestion finished"
        );

        Ok(report)
    }
}
