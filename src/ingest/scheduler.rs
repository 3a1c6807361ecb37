//! Batch scheduling and gap healing for huddle.
//!
//! Runs the per-source orchestrator across all active sources, enforces
//! at-most-one concurrent batch per process, and re-triggers full batches
//! when sources go stale.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration};
use tracing::{debug, error, info, warn};

use crate::config::IngestConfig;
use crate::ingest::fetcher::FeedSource;
use crate::ingest::orchestrator::SourceIngestor;
use crate::ingest::repository::{SourceRepository, TagRepository};
use crate::ingest::tags::TagMatcher;
use crate::Database;

/// Outcome of one batch invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Sources that completed their cycle.
    pub succeeded: usize,
    /// Sources whose fetch failed.
    pub failed: usize,
    /// Newly created content rows across all sources.
    pub created: usize,
    /// Items skipped as already ingested.
    pub skipped: usize,
    /// True when the invocation was a no-op because a batch was running.
    pub already_running: bool,
}

impl BatchSummary {
    fn skipped_batch() -> Self {
        Self {
            already_running: true,
            ..Self::default()
        }
    }
}

/// Batch scheduler with a process-wide single-flight guard.
///
/// Collaborators are passed in explicitly rather than living in global
/// state, so tests can wire in their own.
pub struct IngestScheduler {
    db: Arc<Database>,
    fetcher: Arc<dyn FeedSource + Send + Sync>,
    matcher: Arc<TagMatcher>,
    config: IngestConfig,
    // Single-slot semaphore: the permit is held for the whole batch and
    // released by RAII drop on every exit path.
    running: Semaphore,
}

impl IngestScheduler {
    /// Create a new scheduler.
    pub fn new(
        db: Arc<Database>,
        fetcher: Arc<dyn FeedSource + Send + Sync>,
        matcher: Arc<TagMatcher>,
        config: IngestConfig,
    ) -> Self {
        Self {
            db,
            fetcher,
            matcher,
            config,
            running: Semaphore::new(1),
        }
    }

    /// Run one ingestion batch across all active sources.
    ///
    /// If a batch is already in flight in this process, the call is a
    /// logged no-op. A failure on one source never prevents the remaining
    /// sources from being attempted, and no error escapes the batch.
    pub async fn ingest_all_active_sources(&self) -> BatchSummary {
        let _permit = match self.running.try_acquire() {
            Ok(permit) => permit,
            Err(_) => {
                info!("ingestion batch already running, skipping invocation");
                return BatchSummary::skipped_batch();
            }
        };

        // Lazy-load the tag dictionary on the first batch.
        if !self.matcher.is_loaded() {
            let repo = TagRepository::new(self.db.pool());
            match self.matcher.load(&repo).await {
                Ok(count) => info!(tags = count, "tag dictionary loaded"),
                Err(e) => {
                    error!(error = %e, "failed to load tag dictionary, aborting batch");
                    return BatchSummary::default();
                }
            }
        }

        let sources = match SourceRepository::new(self.db.pool()).list_active().await {
            Ok(sources) => sources,
            Err(e) => {
                error!(error = %e, "failed to list active sources, aborting batch");
                return BatchSummary::default();
            }
        };

        info!(sources = sources.len(), "ingestion batch started");

        let ingestor = SourceIngestor::new(
            &self.db,
            self.fetcher.as_ref(),
            &self.matcher,
            self.config.max_items_per_feed,
        );

        let mut summary = BatchSummary::default();
        for source in &sources {
            match ingestor.ingest_source(source.id).await {
                Ok(report) => {
                    summary.succeeded += 1;
                    summary.created += report.created;
                    summary.skipped += report.skipped;
                }
                Err(e) => {
                    warn!(source = %source.name, error = %e, "source ingestion failed");
                    summary.failed += 1;
                }
            }
        }

        info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            created = summary.created,
            skipped = summary.skipped,
            "ingestion batch finished"
        );

        summary
    }

    /// Scan for stale sources and self-heal with a full batch.
    ///
    /// A source is stale when it has never ingested or when its last
    /// successful ingest is older than the configured threshold. The whole
    /// batch is re-run rather than just the stale sources: dedup makes the
    /// redundant work a no-op.
    pub async fn heal_gaps(&self) -> Option<BatchSummary> {
        let sources = match SourceRepository::new(self.db.pool()).list_active().await {
            Ok(sources) => sources,
            Err(e) => {
                error!(error = %e, "failed to list sources for gap check");
                return None;
            }
        };

        let stale: Vec<_> = sources
            .iter()
            .filter(|s| s.is_stale(self.config.stale_after_secs))
            .collect();

        if stale.is_empty() {
            debug!("gap check found no stale sources");
            return None;
        }

        for source in &stale {
            match source.staleness_secs() {
                Some(age) => warn!(
                    source = %source.name,
                    age_secs = age,
                    "source ingestion is stale"
                ),
                None => warn!(source = %source.name, "source has never been ingested"),
            }
        }

        info!(stale = stale.len(), "gap check triggering catch-up batch");
        Some(self.ingest_all_active_sources().await)
    }

    /// Run the batch timer loop. The first batch starts immediately.
    pub async fn run(&self) {
        info!(
            "ingestion scheduler started (interval: {} seconds)",
            self.config.batch_interval_secs
        );

        let mut timer = interval(Duration::from_secs(self.config.batch_interval_secs));

        loop {
            timer.tick().await;
            self.ingest_all_active_sources().await;
        }
    }

    /// Run the gap-check loop. The first tick fires immediately, which
    /// doubles as the startup gap check.
    pub async fn run_gap_check(&self) {
        info!(
            "gap check started (interval: {} seconds, staleness threshold: {} seconds)",
            self.config.gap_check_interval_secs, self.config.stale_after_secs
        );

        let mut timer = interval(Duration::from_secs(self.config.gap_check_interval_secs));

        loop {
            timer.tick().await;
            self.heal_gaps().await;
        }
    }
}

/// Start the batch scheduler as a background task.
pub fn start_scheduler(scheduler: Arc<IngestScheduler>) -> JoinHandle<()> {
    tokio::spawn(async move {
        scheduler.run().await;
    })
}

/// Start the gap-healing check as a background task.
pub fn start_gap_check(scheduler: Arc<IngestScheduler>) -> JoinHandle<()> {
    tokio::spawn(async move {
        scheduler.run_gap_check().await;
    })
}
