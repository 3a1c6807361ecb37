//! Ingestion repositories for huddle.

use chrono::{DateTime, Utc};

use crate::db::{DbPool, SQL_TRUE};
use crate::ingest::types::{
    Content, ContentKind, NewContent, NewSource, NewTag, Source, SourceKind, Tag, TagType,
    MAX_ERROR_LENGTH,
};
use crate::{HuddleError, Result};

// SQL datetime function for current timestamp
#[cfg(feature = "sqlite")]
const SQL_NOW: &str = "datetime('now')";
#[cfg(feature = "postgres")]
const SQL_NOW: &str = "TO_CHAR(NOW() AT TIME ZONE 'UTC', 'YYYY-MM-DD HH24:MI:SS')";

// Conflict-ignoring inserts differ between backends
#[cfg(feature = "sqlite")]
const INSERT_CONTENT_IGNORE: &str = r#"
    INSERT OR IGNORE INTO content
        (source_id, title, description, canonical_url, thumbnail_url, kind,
         published_at, author, categories)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
    RETURNING id
    "#;
#[cfg(feature = "postgres")]
const INSERT_CONTENT_IGNORE: &str = r#"
    INSERT INTO content
        (source_id, title, description, canonical_url, thumbnail_url, kind,
         published_at, author, categories)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
    ON CONFLICT (canonical_url) DO NOTHING
    RETURNING id
    "#;

#[cfg(feature = "sqlite")]
const INSERT_CONTENT_TAG_IGNORE: &str =
    "INSERT OR IGNORE INTO content_tags (content_id, tag_id) VALUES ($1, $2)";
#[cfg(feature = "postgres")]
const INSERT_CONTENT_TAG_IGNORE: &str =
    "INSERT INTO content_tags (content_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING";

/// Row type for a source from the database.
#[derive(Debug, Clone, sqlx::FromRow)]
struct SourceRow {
    id: i64,
    name: String,
    kind: String,
    feed_url: String,
    website_url: Option<String>,
    logo_url: Option<String>,
    is_active: bool,
    last_fetched_at: Option<String>,
    last_ingested_at: Option<String>,
    last_error: Option<String>,
    error_count: i32,
    created_at: String,
    updated_at: String,
}

impl From<SourceRow> for Source {
    fn from(row: SourceRow) -> Self {
        Source {
            id: row.id,
            name: row.name,
            kind: SourceKind::parse(&row.kind),
            feed_url: row.feed_url,
            website_url: row.website_url,
            logo_url: row.logo_url,
            is_active: row.is_active,
            last_fetched_at: row.last_fetched_at.and_then(|s| parse_datetime(&s)),
            last_ingested_at: row.last_ingested_at.and_then(|s| parse_datetime(&s)),
            last_error: row.last_error,
            error_count: row.error_count,
            created_at: parse_datetime(&row.created_at).unwrap_or_else(Utc::now),
            updated_at: parse_datetime(&row.updated_at).unwrap_or_else(Utc::now),
        }
    }
}

/// Row type for a tag from the database.
#[derive(Debug, Clone, sqlx::FromRow)]
struct TagRow {
    id: i64,
    name: String,
    tag_type: String,
    patterns: String,
    is_active: bool,
    created_at: String,
}

impl From<TagRow> for Tag {
    fn from(row: TagRow) -> Self {
        Tag {
            id: row.id,
            name: row.name,
            tag_type: TagType::parse(&row.tag_type),
            patterns: row.patterns,
            is_active: row.is_active,
            created_at: parse_datetime(&row.created_at).unwrap_or_else(Utc::now),
        }
    }
}

/// Row type for a content item from the database.
#[derive(Debug, Clone, sqlx::FromRow)]
struct ContentRow {
    id: i64,
    source_id: i64,
    title: String,
    description: Option<String>,
    canonical_url: String,
    thumbnail_url: Option<String>,
    kind: String,
    published_at: String,
    author: Option<String>,
    categories: Option<String>,
    created_at: String,
}

impl From<ContentRow> for Content {
    fn from(row: ContentRow) -> Self {
        Content {
            id: row.id,
            source_id: row.source_id,
            title: row.title,
            description: row.description,
            canonical_url: row.canonical_url,
            thumbnail_url: row.thumbnail_url,
            kind: ContentKind::parse(&row.kind),
            published_at: parse_datetime(&row.published_at).unwrap_or_else(Utc::now),
            author: row.author,
            categories: row
                .categories
                .as_deref()
                .and_then(|s| serde_json::from_str(s).ok())
                .unwrap_or_default(),
            created_at: parse_datetime(&row.created_at).unwrap_or_else(Utc::now),
        }
    }
}

/// Repository for source operations.
pub struct SourceRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> SourceRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a new source.
    pub async fn create(&self, source: &NewSource) -> Result<Source> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO sources (name, kind, feed_url, website_url, logo_url)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&source.name)
        .bind(source.kind.as_str())
        .bind(&source.feed_url)
        .bind(&source.website_url)
        .bind(&source.logo_url)
        .fetch_one(self.pool)
        .await
        .map_err(|e| HuddleError::Database(e.to_string()))?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| HuddleError::NotFound("source".into()))
    }

    /// Get a source by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Source>> {
        let row = sqlx::query_as::<_, SourceRow>(
            r#"
            SELECT id, name, kind, feed_url, website_url, logo_url, is_active,
                   last_fetched_at, last_ingested_at, last_error, error_count,
                   created_at, updated_at
            FROM sources
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| HuddleError::Database(e.to_string()))?;

        Ok(row.map(Source::from))
    }

    /// Get a source by feed URL.
    pub async fn get_by_feed_url(&self, feed_url: &str) -> Result<Option<Source>> {
        let row = sqlx::query_as::<_, SourceRow>(
            r#"
            SELECT id, name, kind, feed_url, website_url, logo_url, is_active,
                   last_fetched_at, last_ingested_at, last_error, error_count,
                   created_at, updated_at
            FROM sources
            WHERE feed_url = $1
            "#,
        )
        .bind(feed_url)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| HuddleError::Database(e.to_string()))?;

        Ok(row.map(Source::from))
    }

    /// List active sources in stable alphabetical order.
    ///
    /// Batch processing order is deterministic so logs line up run to run.
    pub async fn list_active(&self) -> Result<Vec<Source>> {
        let query = format!(
            r#"
            SELECT id, name, kind, feed_url, website_url, logo_url, is_active,
                   last_fetched_at, last_ingested_at, last_error, error_count,
                   created_at, updated_at
            FROM sources
            WHERE is_active = {}
            ORDER BY name ASC, id ASC
            "#,
            SQL_TRUE
        );
        let rows = sqlx::query_as::<_, SourceRow>(&query)
            .fetch_all(self.pool)
            .await
            .map_err(|e| HuddleError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(Source::from).collect())
    }

    /// List all sources (including inactive).
    pub async fn list_all(&self) -> Result<Vec<Source>> {
        let rows = sqlx::query_as::<_, SourceRow>(
            r#"
            SELECT id, name, kind, feed_url, website_url, logo_url, is_active,
                   last_fetched_at, last_ingested_at, last_error, error_count,
                   created_at, updated_at
            FROM sources
            ORDER BY name ASC, id ASC
            "#,
        )
        .fetch_all(self.pool)
        .await
        .map_err(|e| HuddleError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(Source::from).collect())
    }

    /// Toggle a source's active flag.
    pub async fn set_active(&self, id: i64, active: bool) -> Result<bool> {
        let query = format!(
            "UPDATE sources SET is_active = $1, updated_at = {} WHERE id = $2",
            SQL_NOW
        );
        let result = sqlx::query(&query)
            .bind(active)
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| HuddleError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Record a failed fetch cycle.
    ///
    /// The fetch attempt timestamp is still written so operators can see
    /// the attempt happened; the last successful ingest timestamp is left
    /// unchanged. The error message is truncated to the storage bound.
    pub async fn record_fetch_failure(&self, id: i64, error: &str) -> Result<bool> {
        let message: String = error.chars().take(MAX_ERROR_LENGTH).collect();
        let query = format!(
            r#"
            UPDATE sources
            SET last_fetched_at = {},
                last_error = $1,
                error_count = error_count + 1,
                updated_at = {}
            WHERE id = $2
            "#,
            SQL_NOW, SQL_NOW
        );
        let result = sqlx::query(&query)
            .bind(message)
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| HuddleError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Record a successful ingest cycle.
    pub async fn record_ingest_success(&self, id: i64) -> Result<bool> {
        let query = format!(
            r#"
            UPDATE sources
            SET last_fetched_at = {},
                last_ingested_at = {},
                last_error = NULL,
                error_count = 0,
                updated_at = {}
            WHERE id = $1
            "#,
            SQL_NOW, SQL_NOW, SQL_NOW
        );
        let result = sqlx::query(&query)
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| HuddleError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Count all sources.
    pub async fn count(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sources")
            .fetch_one(self.pool)
            .await
            .map_err(|e| HuddleError::Database(e.to_string()))?;

        Ok(count.0)
    }
}

/// Repository for tag operations.
pub struct TagRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> TagRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a new tag.
    pub async fn create(&self, tag: &NewTag) -> Result<Tag> {
        let patterns = serde_json::to_string(&tag.patterns)
            .map_err(|e| HuddleError::Validation(format!("unserializable pattern list: {e}")))?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO tags (name, tag_type, patterns)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(&tag.name)
        .bind(tag.tag_type.as_str())
        .bind(&patterns)
        .fetch_one(self.pool)
        .await
        .map_err(|e| HuddleError::Database(e.to_string()))?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| HuddleError::NotFound("tag".into()))
    }

    /// Get a tag by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Tag>> {
        let row = sqlx::query_as::<_, TagRow>(
            r#"
            SELECT id, name, tag_type, patterns, is_active, created_at
            FROM tags
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| HuddleError::Database(e.to_string()))?;

        Ok(row.map(Tag::from))
    }

    /// Get a tag by name.
    pub async fn get_by_name(&self, name: &str) -> Result<Option<Tag>> {
        let row = sqlx::query_as::<_, TagRow>(
            r#"
            SELECT id, name, tag_type, patterns, is_active, created_at
            FROM tags
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| HuddleError::Database(e.to_string()))?;

        Ok(row.map(Tag::from))
    }

    /// List active tags in dictionary (row) order.
    pub async fn list_active(&self) -> Result<Vec<Tag>> {
        let query = format!(
            r#"
            SELECT id, name, tag_type, patterns, is_active, created_at
            FROM tags
            WHERE is_active = {}
            ORDER BY id ASC
            "#,
            SQL_TRUE
        );
        let rows = sqlx::query_as::<_, TagRow>(&query)
            .fetch_all(self.pool)
            .await
            .map_err(|e| HuddleError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(Tag::from).collect())
    }

    /// Count all tags.
    pub async fn count(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tags")
            .fetch_one(self.pool)
            .await
            .map_err(|e| HuddleError::Database(e.to_string()))?;

        Ok(count.0)
    }
}

/// Repository for content operations.
pub struct ContentRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> ContentRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Insert a content row together with its tag associations.
    ///
    /// The whole write happens in one transaction, so a content row is
    /// never observable without its tags. The insert ignores canonical-URL
    /// conflicts: a concurrent writer racing on the same URL makes this
    /// call return `None` instead of creating a duplicate.
    pub async fn create_with_tags(
        &self,
        content: &NewContent,
        tag_ids: &[i64],
    ) -> Result<Option<i64>> {
        let categories = serde_json::to_string(&content.categories)
            .map_err(|e| HuddleError::Validation(format!("unserializable categories: {e}")))?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| HuddleError::Database(e.to_string()))?;

        let inserted: Option<(i64,)> = sqlx::query_as(INSERT_CONTENT_IGNORE)
            .bind(content.source_id)
            .bind(&content.title)
            .bind(&content.description)
            .bind(&content.canonical_url)
            .bind(&content.thumbnail_url)
            .bind(content.kind.as_str())
            .bind(content.published_at.to_rfc3339())
            .bind(&content.author)
            .bind(&categories)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| HuddleError::Database(e.to_string()))?;

        let Some((content_id,)) = inserted else {
            // Lost the race on canonical_url; nothing to tag.
            tx.rollback()
                .await
                .map_err(|e| HuddleError::Database(e.to_string()))?;
            return Ok(None);
        };

        for tag_id in tag_ids {
            sqlx::query(INSERT_CONTENT_TAG_IGNORE)
                .bind(content_id)
                .bind(tag_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| HuddleError::Database(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| HuddleError::Database(e.to_string()))?;

        Ok(Some(content_id))
    }

    /// Get a content item by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Content>> {
        let row = sqlx::query_as::<_, ContentRow>(
            r#"
            SELECT id, source_id, title, description, canonical_url, thumbnail_url,
                   kind, published_at, author, categories, created_at
            FROM content
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| HuddleError::Database(e.to_string()))?;

        Ok(row.map(Content::from))
    }

    /// Get a content item by canonical URL.
    pub async fn get_by_canonical_url(&self, canonical_url: &str) -> Result<Option<Content>> {
        let row = sqlx::query_as::<_, ContentRow>(
            r#"
            SELECT id, source_id, title, description, canonical_url, thumbnail_url,
                   kind, published_at, author, categories, created_at
            FROM content
            WHERE canonical_url = $1
            "#,
        )
        .bind(canonical_url)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| HuddleError::Database(e.to_string()))?;

        Ok(row.map(Content::from))
    }

    /// List content for a source (newest first).
    pub async fn list_by_source(
        &self,
        source_id: i64,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Content>> {
        let rows = sqlx::query_as::<_, ContentRow>(
            r#"
            SELECT id, source_id, title, description, canonical_url, thumbnail_url,
                   kind, published_at, author, categories, created_at
            FROM content
            WHERE source_id = $1
            ORDER BY published_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(source_id)
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(self.pool)
        .await
        .map_err(|e| HuddleError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(Content::from).collect())
    }

    /// Tag IDs associated with a content item.
    pub async fn tag_ids(&self, content_id: i64) -> Result<Vec<i64>> {
        let rows: Vec<(i64,)> = sqlx::query_as(
            "SELECT tag_id FROM content_tags WHERE content_id = $1 ORDER BY tag_id ASC",
        )
        .bind(content_id)
        .fetch_all(self.pool)
        .await
        .map_err(|e| HuddleError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    /// Count all content rows.
    pub async fn count(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM content")
            .fetch_one(self.pool)
            .await
            .map_err(|e| HuddleError::Database(e.to_string()))?;

        Ok(count.0)
    }

    /// Count content rows for a source.
    pub async fn count_by_source(&self, source_id: i64) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM content WHERE source_id = $1")
            .bind(source_id)
            .fetch_one(self.pool)
            .await
            .map_err(|e| HuddleError::Database(e.to_string()))?;

        Ok(count.0)
    }
}

/// Parse a stored datetime (RFC3339 or SQL datetime format).
fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    // Try RFC3339 first
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // Try SQL datetime format
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(DateTime::from_naive_utc_and_offset(naive, Utc));
    }
    None
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use super::*;
    use crate::ingest::types::TagType;
    use crate::Database;
    use chrono::TimeZone;

    async fn setup_db() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    async fn create_test_source(db: &Database, name: &str, url: &str) -> Source {
        let repo = SourceRepository::new(db.pool());
        repo.create(&NewSource::new(name, url)).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get_source() {
        let db = setup_db().await;
        let repo = SourceRepository::new(db.pool());

        let source = repo
            .create(
                &NewSource::new("Rotoworld", "https://example.com/feed.xml")
                    .with_kind(SourceKind::Rss)
                    .with_website_url("https://example.com"),
            )
            .await
            .unwrap();

        assert_eq!(source.name, "Rotoworld");
        assert!(source.is_active);
        assert!(source.last_fetched_at.is_none());
        assert!(source.last_ingested_at.is_none());
        assert_eq!(source.error_count, 0);

        let by_url = repo
            .get_by_feed_url("https://example.com/feed.xml")
            .await
            .unwrap();
        assert_eq!(by_url.unwrap().id, source.id);
    }

    #[tokio::test]
    async fn test_feed_url_is_unique() {
        let db = setup_db().await;
        let repo = SourceRepository::new(db.pool());

        repo.create(&NewSource::new("A", "https://example.com/feed.xml"))
            .await
            .unwrap();
        let dup = repo
            .create(&NewSource::new("B", "https://example.com/feed.xml"))
            .await;
        assert!(dup.is_err());
    }

    #[tokio::test]
    async fn test_list_active_is_alphabetical() {
        let db = setup_db().await;
        let repo = SourceRepository::new(db.pool());

        create_test_source(&db, "Zebra Report", "https://z.example/feed").await;
        create_test_source(&db, "Apple Analysis", "https://a.example/feed").await;
        let middle = create_test_source(&db, "Mid Takes", "https://m.example/feed").await;
        repo.set_active(middle.id, false).await.unwrap();

        let active = repo.list_active().await.unwrap();
        let names: Vec<&str> = active.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Apple Analysis", "Zebra Report"]);
    }

    #[tokio::test]
    async fn test_record_fetch_failure_and_success() {
        let db = setup_db().await;
        let repo = SourceRepository::new(db.pool());
        let source = create_test_source(&db, "Test", "https://t.example/feed").await;

        repo.record_fetch_failure(source.id, "HTTP error: 503")
            .await
            .unwrap();
        let failed = repo.get_by_id(source.id).await.unwrap().unwrap();
        assert!(failed.last_fetched_at.is_some());
        assert!(failed.last_ingested_at.is_none());
        assert_eq!(failed.last_error.as_deref(), Some("HTTP error: 503"));
        assert_eq!(failed.error_count, 1);

        repo.record_fetch_failure(source.id, "timeout").await.unwrap();
        let failed_again = repo.get_by_id(source.id).await.unwrap().unwrap();
        assert_eq!(failed_again.error_count, 2);

        repo.record_ingest_success(source.id).await.unwrap();
        let healthy = repo.get_by_id(source.id).await.unwrap().unwrap();
        assert!(healthy.last_ingested_at.is_some());
        assert!(healthy.last_error.is_none());
        assert_eq!(healthy.error_count, 0);
    }

    #[tokio::test]
    async fn test_fetch_failure_message_is_truncated() {
        let db = setup_db().await;
        let repo = SourceRepository::new(db.pool());
        let source = create_test_source(&db, "Test", "https://t.example/feed").await;

        let long_error = "x".repeat(MAX_ERROR_LENGTH + 200);
        repo.record_fetch_failure(source.id, &long_error)
            .await
            .unwrap();
        let stored = repo.get_by_id(source.id).await.unwrap().unwrap();
        assert_eq!(stored.last_error.unwrap().chars().count(), MAX_ERROR_LENGTH);
    }

    #[tokio::test]
    async fn test_create_and_list_tags() {
        let db = setup_db().await;
        let repo = TagRepository::new(db.pool());

        let tag = repo
            .create(
                &NewTag::new("Patrick Mahomes", TagType::Player)
                    .with_pattern(r"\bmahomes\b"),
            )
            .await
            .unwrap();
        assert_eq!(tag.tag_type, TagType::Player);
        assert!(tag.patterns.contains("mahomes"));

        let by_name = repo.get_by_name("Patrick Mahomes").await.unwrap();
        assert_eq!(by_name.unwrap().id, tag.id);

        let active = repo.list_active().await.unwrap();
        assert_eq!(active.len(), 1);
    }

    #[tokio::test]
    async fn test_create_with_tags_dedups_by_canonical_url() {
        let db = setup_db().await;
        let source = create_test_source(&db, "Test", "https://t.example/feed").await;
        let tags = TagRepository::new(db.pool());
        let tag = tags
            .create(&NewTag::new("waivers", TagType::Topic).with_pattern("waiver"))
            .await
            .unwrap();

        let repo = ContentRepository::new(db.pool());
        let new_content = NewContent::new(
            source.id,
            "Week 10 Waivers",
            "https://t.example/waivers-10",
            ContentKind::Article,
            Utc::now(),
        );

        let first = repo
            .create_with_tags(&new_content, &[tag.id])
            .await
            .unwrap();
        assert!(first.is_some());

        // Second insert with the same canonical URL is ignored
        let second = repo
            .create_with_tags(&new_content, &[tag.id])
            .await
            .unwrap();
        assert!(second.is_none());
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_create_with_tags_stores_associations() {
        let db = setup_db().await;
        let source = create_test_source(&db, "Test", "https://t.example/feed").await;
        let tags = TagRepository::new(db.pool());
        let t1 = tags
            .create(&NewTag::new("a", TagType::Keyword).with_pattern("a"))
            .await
            .unwrap();
        let t2 = tags
            .create(&NewTag::new("b", TagType::Keyword).with_pattern("b"))
            .await
            .unwrap();

        let repo = ContentRepository::new(db.pool());
        let id = repo
            .create_with_tags(
                &NewContent::new(
                    source.id,
                    "Title",
                    "https://t.example/a",
                    ContentKind::Article,
                    Utc::now(),
                )
                .with_author("Staff")
                .with_categories(vec!["News".to_string()]),
                &[t1.id, t2.id],
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(repo.tag_ids(id).await.unwrap(), vec![t1.id, t2.id]);

        let content = repo.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(content.author.as_deref(), Some("Staff"));
        assert_eq!(content.categories, vec!["News".to_string()]);
        assert_eq!(content.kind, ContentKind::Article);
    }

    #[tokio::test]
    async fn test_list_by_source_newest_first() {
        let db = setup_db().await;
        let source = create_test_source(&db, "Test", "https://t.example/feed").await;
        let repo = ContentRepository::new(db.pool());

        for (i, day) in [3, 1, 2].iter().enumerate() {
            let published = chrono::Utc
                .with_ymd_and_hms(2024, 11, *day, 0, 0, 0)
                .unwrap();
            repo.create_with_tags(
                &NewContent::new(
                    source.id,
                    format!("Item {i}"),
                    format!("https://t.example/{i}"),
                    ContentKind::Article,
                    published,
                ),
                &[],
            )
            .await
            .unwrap();
        }

        let items = repo.list_by_source(source.id, 10, 0).await.unwrap();
        assert_eq!(items.len(), 3);
        assert!(items[0].published_at > items[1].published_at);
        assert!(items[1].published_at > items[2].published_at);
    }

    #[tokio::test]
    async fn test_parse_datetime_formats() {
        assert!(parse_datetime("2024-11-04T12:00:00+00:00").is_some());
        assert!(parse_datetime("2024-11-04 12:00:00").is_some());
        assert!(parse_datetime("not a date").is_none());
    }
}
