//! Database schema and migrations for huddle.
//!
//! This module contains all database migrations that will be applied
//! sequentially when the database is first opened or upgraded.

/// Database migrations.
///
/// Each migration is a SQL script that will be executed in order.
/// The schema_version table tracks which migrations have been applied.
#[cfg(feature = "sqlite")]
pub const MIGRATIONS: &[&str] = &[
    // v1: Sources table - configured content origins
    r#"
-- Sources table: one row per polled feed
CREATE TABLE sources (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    name             TEXT NOT NULL,
    kind             TEXT NOT NULL DEFAULT 'rss',  -- 'rss', 'video_channel', 'audio_feed'
    feed_url         TEXT NOT NULL UNIQUE,
    website_url      TEXT,
    logo_url         TEXT,
    is_active        INTEGER NOT NULL DEFAULT 1,
    last_fetched_at  TEXT,
    last_ingested_at TEXT,
    last_error       TEXT,
    error_count      INTEGER NOT NULL DEFAULT 0,
    created_at       TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at       TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_sources_is_active ON sources(is_active);
CREATE INDEX idx_sources_name ON sources(name);
"#,
    // v2: Tags table - classification dictionary
    r#"
-- Tags table: classification entries with their regex pattern lists
CREATE TABLE tags (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    name       TEXT NOT NULL UNIQUE,
    tag_type   TEXT NOT NULL DEFAULT 'keyword',  -- 'player', 'team', 'position', 'topic', 'keyword'
    patterns   TEXT NOT NULL DEFAULT '[]',       -- JSON array of regex strings
    is_active  INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#,
    // v3: Content and content_tags tables
    r#"
-- Content table: one row per ingested item, keyed by canonical URL
CREATE TABLE content (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    source_id     INTEGER NOT NULL REFERENCES sources(id) ON DELETE CASCADE,
    title         TEXT NOT NULL,
    description   TEXT,
    canonical_url TEXT NOT NULL UNIQUE,
    thumbnail_url TEXT,
    kind          TEXT NOT NULL DEFAULT 'article',  -- 'article', 'video', 'audio'
    published_at  TEXT NOT NULL,
    author        TEXT,
    categories    TEXT,                             -- JSON array of category strings
    created_at    TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_content_source_id ON content(source_id);
CREATE INDEX idx_content_published_at ON content(published_at);

-- Content-tag associations, created together with their content row
CREATE TABLE content_tags (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    content_id INTEGER NOT NULL REFERENCES content(id) ON DELETE CASCADE,
    tag_id     INTEGER NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
    UNIQUE(content_id, tag_id)
);

CREATE INDEX idx_content_tags_tag_id ON content_tags(tag_id);
"#,
];

/// Database migrations (PostgreSQL dialect).
#[cfg(feature = "postgres")]
pub const MIGRATIONS: &[&str] = &[
    // v1: Sources table - configured content origins
    r#"
CREATE TABLE sources (
    id               BIGSERIAL PRIMARY KEY,
    name             TEXT NOT NULL,
    kind             TEXT NOT NULL DEFAULT 'rss',
    feed_url         TEXT NOT NULL UNIQUE,
    website_url      TEXT,
    logo_url         TEXT,
    is_active        BOOLEAN NOT NULL DEFAULT TRUE,
    last_fetched_at  TEXT,
    last_ingested_at TEXT,
    last_error       TEXT,
    error_count      INTEGER NOT NULL DEFAULT 0,
    created_at       TEXT NOT NULL DEFAULT TO_CHAR(NOW() AT TIME ZONE 'UTC', 'YYYY-MM-DD HH24:MI:SS'),
    updated_at       TEXT NOT NULL DEFAULT TO_CHAR(NOW() AT TIME ZONE 'UTC', 'YYYY-MM-DD HH24:MI:SS')
);

CREATE INDEX idx_sources_is_active ON sources(is_active);
CREATE INDEX idx_sources_name ON sources(name);
"#,
    // v2: Tags table - classification dictionary
    r#"
CREATE TABLE tags (
    id         BIGSERIAL PRIMARY KEY,
    name       TEXT NOT NULL UNIQUE,
    tag_type   TEXT NOT NULL DEFAULT 'keyword',
    patterns   TEXT NOT NULL DEFAULT '[]',
    is_active  BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TEXT NOT NULL DEFAULT TO_CHAR(NOW() AT TIME ZONE 'UTC', 'YYYY-MM-DD HH24:MI:SS')
);
"#,
    // v3: Content and content_tags tables
    r#"
CREATE TABLE content (
    id            BIGSERIAL PRIMARY KEY,
    source_id     BIGINT NOT NULL REFERENCES sources(id) ON DELETE CASCADE,
    title         TEXT NOT NULL,
    description   TEXT,
    canonical_url TEXT NOT NULL UNIQUE,
    thumbnail_url TEXT,
    kind          TEXT NOT NULL DEFAULT 'article',
    published_at  TEXT NOT NULL,
    author        TEXT,
    categories    TEXT,
    created_at    TEXT NOT NULL DEFAULT TO_CHAR(NOW() AT TIME ZONE 'UTC', 'YYYY-MM-DD HH24:MI:SS')
);

CREATE INDEX idx_content_source_id ON content(source_id);
CREATE INDEX idx_content_published_at ON content(published_at);

CREATE TABLE content_tags (
    id         BIGSERIAL PRIMARY KEY,
    content_id BIGINT NOT NULL REFERENCES content(id) ON DELETE CASCADE,
    tag_id     BIGINT NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
    UNIQUE(content_id, tag_id)
);

CREATE INDEX idx_content_tags_tag_id ON content_tags(tag_id);
"#,
];
