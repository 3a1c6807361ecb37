//! Dedup and persistence gateway for huddle.
//!
//! The gateway is the only write path for ingested content. It checks the
//! canonical URL against the corpus and, for new items, persists the
//! content row together with its tag associations as one unit.

use tracing::debug;

use crate::db::DbPool;
use crate::ingest::repository::ContentRepository;
use crate::ingest::types::{NewContent, NormalizedItem};
use crate::Result;

/// Outcome of a persist attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    /// A new content row was created with the given ID.
    Created(i64),
    /// A row with the same canonical URL already exists.
    Skipped,
}

/// Gateway for deduplicated content persistence.
pub struct ContentGateway<'a> {
    pool: &'a DbPool,
}

impl<'a> ContentGateway<'a> {
    /// Create a new gateway instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Persist a normalized item with its matched tag identifiers.
    ///
    /// The canonical-URL uniqueness constraint is the sole dedup mechanism:
    /// the up-front lookup is an optimization, and the conflict-ignoring
    /// insert underneath it keeps concurrent ingestion of the same URL from
    /// creating duplicates or partial writes.
    pub async fn persist(
        &self,
        source_id: i64,
        item: &NormalizedItem,
        tag_ids: &[i64],
    ) -> Result<PersistOutcome> {
        let repo = ContentRepository::new(self.pool);

        if repo
            .get_by_canonical_url(&item.canonical_url)
            .await?
            .is_some()
        {
            debug!(canonical_url = %item.canonical_url, "content already ingested, skipping");
            return Ok(PersistOutcome::Skipped);
        }

        let mut new_content = NewContent::new(
            source_id,
            &item.title,
            &item.canonical_url,
            item.kind,
            item.published_at,
        );
        if let Some(description) = &item.description {
            new_content = new_content.with_description(description);
        }
        if let Some(thumbnail_url) = &item.thumbnail_url {
            new_content = new_content.with_thumbnail_url(thumbnail_url);
        }
        if let Some(author) = &item.author {
            new_content = new_content.with_author(author);
        }
        if !item.categories.is_empty() {
            new_content = new_content.with_categories(item.categories.clone());
        }

        match repo.create_with_tags(&new_content, tag_ids).await? {
            Some(id) => Ok(PersistOutcome::Created(id)),
            None => {
                debug!(canonical_url = %item.canonical_url, "lost insert race, skipping");
                Ok(PersistOutcome::Skipped)
            }
        }
    }
}
