//! Seed file loading for huddle.
//!
//! Operators can point the service at a TOML file with sources and tags to
//! register. Entries are matched by their unique key (feed URL / tag name)
//! and only missing rows are created, so re-applying a seed file is safe.

use serde::Deserialize;
use std::path::Path;
use tracing::info;

use crate::error::{HuddleError, Result};
use crate::ingest::repository::{SourceRepository, TagRepository};
use crate::ingest::types::{NewSource, NewTag, SourceKind, TagType};
use crate::Database;

/// A seed file with sources and tags.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedFile {
    /// Sources to register.
    #[serde(default)]
    pub sources: Vec<SeedSource>,
    /// Tags to register.
    #[serde(default)]
    pub tags: Vec<SeedTag>,
}

/// One source entry in a seed file.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedSource {
    /// Display name.
    pub name: String,
    /// Feed kind ("rss", "video_channel", "audio_feed").
    #[serde(default)]
    pub kind: Option<String>,
    /// Feed URL (the unique key).
    pub feed_url: String,
    /// Website URL.
    #[serde(default)]
    pub website_url: Option<String>,
    /// Logo URL.
    #[serde(default)]
    pub logo_url: Option<String>,
}

/// One tag entry in a seed file.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedTag {
    /// Tag name (the unique key).
    pub name: String,
    /// Classification type ("player", "team", "position", "topic", "keyword").
    #[serde(default)]
    pub tag_type: Option<String>,
    /// Regex pattern strings.
    pub patterns: Vec<String>,
}

/// Counts of rows created by a seed application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    /// Sources created.
    pub sources_added: usize,
    /// Tags created.
    pub tags_added: usize,
}

/// Parse and apply a seed file.
pub async fn apply_seed_file(db: &Database, path: impl AsRef<Path>) -> Result<SeedReport> {
    let content = std::fs::read_to_string(path.as_ref()).map_err(HuddleError::Io)?;
    let seed: SeedFile = toml::from_str(&content)
        .map_err(|e| HuddleError::Validation(format!("seed file parse error: {e}")))?;
    apply_seed(db, &seed).await
}

/// Apply a parsed seed, creating only rows that don't exist yet.
pub async fn apply_seed(db: &Database, seed: &SeedFile) -> Result<SeedReport> {
    let mut report = SeedReport::default();

    let sources = SourceRepository::new(db.pool());
    for entry in &seed.sources {
        if sources.get_by_feed_url(&entry.feed_url).await?.is_some() {
            continue;
        }
        let mut new_source = NewSource::new(&entry.name, &entry.feed_url);
        if let Some(kind) = &entry.kind {
            new_source = new_source.with_kind(SourceKind::parse(kind));
        }
        if let Some(website_url) = &entry.website_url {
            new_source = new_source.with_website_url(website_url);
        }
        if let Some(logo_url) = &entry.logo_url {
            new_source = new_source.with_logo_url(logo_url);
        }
        sources.create(&new_source).await?;
        info!(source = %entry.name, "seeded source");
        report.sources_added += 1;
    }

    let tags = TagRepository::new(db.pool());
    for entry in &seed.tags {
        if tags.get_by_name(&entry.name).await?.is_some() {
            continue;
        }
        let tag_type = entry
            .tag_type
            .as_deref()
            .map(TagType::parse)
            .unwrap_or(TagType::Keyword);
        tags.create(&NewTag::new(&entry.name, tag_type).with_patterns(entry.patterns.clone()))
            .await?;
        info!(tag = %entry.name, "seeded tag");
        report.tags_added += 1;
    }

    Ok(report)
}
