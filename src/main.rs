use std::sync::Arc;

use tracing::{info, warn};

use huddle::ingest::{
    apply_seed_file, start_gap_check, start_scheduler, FeedFetcher, IngestScheduler,
    TagMatcher, TagRepository,
};
use huddle::{Config, Database};

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::load("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.toml: {e}");
            eprintln!("Using default configuration.");
            Config::default()
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {e}");
        std::process::exit(1);
    }

    // Initialize logging
    if let Err(e) = huddle::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        huddle::logging::init_console_only(&config.logging.level);
    }

    info!("huddle - fantasy football content ingestion service");

    let db = match Database::open(&config.database.path).await {
        Ok(db) => Arc::new(db),
        Err(e) => {
            eprintln!("Failed to open database: {e}");
            std::process::exit(1);
        }
    };

    // Register operator-defined sources and tags before the first batch
    if let Some(seed_path) = &config.ingest.seed_path {
        match apply_seed_file(&db, seed_path).await {
            Ok(report) => info!(
                sources = report.sources_added,
                tags = report.tags_added,
                "seed file applied"
            ),
            Err(e) => warn!(error = %e, "failed to apply seed file"),
        }
    }

    let fetcher = match FeedFetcher::new(&config.ingest) {
        Ok(fetcher) => Arc::new(fetcher),
        Err(e) => {
            eprintln!("Failed to create feed fetcher: {e}");
            std::process::exit(1);
        }
    };

    // The dictionary must be loaded before any batch runs; matching without
    // it is a hard error, not a silent no-tag pass.
    let matcher = Arc::new(TagMatcher::new());
    match matcher.load(&TagRepository::new(db.pool())).await {
        Ok(count) => info!(tags = count, "tag dictionary loaded"),
        Err(e) => {
            eprintln!("Failed to load tag dictionary: {e}");
            std::process::exit(1);
        }
    }

    let scheduler = Arc::new(IngestScheduler::new(
        db,
        fetcher,
        matcher,
        config.ingest.clone(),
    ));

    // Hourly batches plus the daily gap check; the gap check's first tick
    // fires immediately and doubles as the startup staleness scan.
    let batch_task = start_scheduler(scheduler.clone());
    let gap_task = start_gap_check(scheduler);

    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => warn!(error = %e, "failed to listen for shutdown signal"),
    }

    batch_task.abort();
    gap_task.abort();
}
