//! Ingestion domain types for huddle.

use chrono::{DateTime, Utc};

/// Maximum length for a content description.
pub const MAX_DESCRIPTION_LENGTH: usize = 10000;

/// Maximum length for a source's stored error message.
pub const MAX_ERROR_LENGTH: usize = 500;

/// Maximum number of items to process per source per cycle.
pub const MAX_ITEMS_PER_FEED: usize = 100;

/// Maximum feed size in bytes (5MB).
pub const MAX_FEED_SIZE: u64 = 5 * 1024 * 1024;

/// Age in seconds after which a source's last ingest counts as stale.
pub const DEFAULT_STALE_AFTER_SECS: i64 = 7200;

/// Placeholder title for feed items without one.
pub const UNTITLED_PLACEHOLDER: &str = "(untitled)";

/// The kind of feed a source publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// An RSS/Atom article feed.
    Rss,
    /// A video channel feed (media-group thumbnails, video items).
    VideoChannel,
    /// A podcast/audio feed.
    AudioFeed,
}

impl SourceKind {
    /// Database representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Rss => "rss",
            SourceKind::VideoChannel => "video_channel",
            SourceKind::AudioFeed => "audio_feed",
        }
    }

    /// Parse the database representation. Unknown values fall back to `Rss`.
    pub fn parse(s: &str) -> Self {
        match s {
            "video_channel" => SourceKind::VideoChannel,
            "audio_feed" => SourceKind::AudioFeed,
            _ => SourceKind::Rss,
        }
    }

    /// The content kind produced by this source kind.
    ///
    /// A pure function of the source kind only, independent of item content.
    pub fn content_kind(&self) -> ContentKind {
        match self {
            SourceKind::VideoChannel => ContentKind::Video,
            SourceKind::AudioFeed => ContentKind::Audio,
            SourceKind::Rss => ContentKind::Article,
        }
    }
}

/// The kind of an ingested content item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Article,
    Video,
    Audio,
}

impl ContentKind {
    /// Database representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Article => "article",
            ContentKind::Video => "video",
            ContentKind::Audio => "audio",
        }
    }

    /// Parse the database representation. Unknown values fall back to `Article`.
    pub fn parse(s: &str) -> Self {
        match s {
            "video" => ContentKind::Video,
            "audio" => ContentKind::Audio,
            _ => ContentKind::Article,
        }
    }
}

/// The classification type of a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagType {
    Player,
    Team,
    Position,
    Topic,
    Keyword,
}

impl TagType {
    /// Database representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            TagType::Player => "player",
            TagType::Team => "team",
            TagType::Position => "position",
            TagType::Topic => "topic",
            TagType::Keyword => "keyword",
        }
    }

    /// Parse the database representation. Unknown values fall back to `Keyword`.
    pub fn parse(s: &str) -> Self {
        match s {
            "player" => TagType::Player,
            "team" => TagType::Team,
            "position" => TagType::Position,
            "topic" => TagType::Topic,
            _ => TagType::Keyword,
        }
    }
}

/// A configured content origin.
#[derive(Debug, Clone)]
pub struct Source {
    /// Source ID.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Feed kind.
    pub kind: SourceKind,
    /// Feed URL (unique).
    pub feed_url: String,
    /// Website URL.
    pub website_url: Option<String>,
    /// Logo URL.
    pub logo_url: Option<String>,
    /// Whether the source is polled.
    pub is_active: bool,
    /// Last time a fetch was attempted.
    pub last_fetched_at: Option<DateTime<Utc>>,
    /// Last time a fetch cycle completed successfully.
    pub last_ingested_at: Option<DateTime<Utc>>,
    /// Last failure message, truncated.
    pub last_error: Option<String>,
    /// Number of consecutive failed cycles.
    pub error_count: i32,
    /// When the source was created.
    pub created_at: DateTime<Utc>,
    /// When the source was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Source {
    /// Check whether this source has not ingested successfully within the
    /// staleness window. Sources that never ingested are always stale.
    pub fn is_stale(&self, stale_after_secs: i64) -> bool {
        if !self.is_active {
            return false;
        }
        match self.last_ingested_at {
            None => true,
            Some(last) => {
                let elapsed = Utc::now().signed_duration_since(last);
                elapsed.num_seconds() >= stale_after_secs
            }
        }
    }

    /// Seconds since the last successful ingest, if any.
    pub fn staleness_secs(&self) -> Option<i64> {
        self.last_ingested_at
            .map(|last| Utc::now().signed_duration_since(last).num_seconds())
    }
}

/// New source for creation.
#[derive(Debug, Clone)]
pub struct NewSource {
    /// Display name.
    pub name: String,
    /// Feed kind.
    pub kind: SourceKind,
    /// Feed URL.
    pub feed_url: String,
    /// Website URL.
    pub website_url: Option<String>,
    /// Logo URL.
    pub logo_url: Option<String>,
}

impl NewSource {
    /// Create a new source.
    pub fn new(name: impl Into<String>, feed_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: SourceKind::Rss,
            feed_url: feed_url.into(),
            website_url: None,
            logo_url: None,
        }
    }

    /// Set the feed kind.
    pub fn with_kind(mut self, kind: SourceKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set the website URL.
    pub fn with_website_url(mut self, url: impl Into<String>) -> Self {
        self.website_url = Some(url.into());
        self
    }

    /// Set the logo URL.
    pub fn with_logo_url(mut self, url: impl Into<String>) -> Self {
        self.logo_url = Some(url.into());
        self
    }
}

/// A classification tag with its stored pattern list.
#[derive(Debug, Clone)]
pub struct Tag {
    /// Tag ID.
    pub id: i64,
    /// Tag name (unique).
    pub name: String,
    /// Classification type.
    pub tag_type: TagType,
    /// JSON-encoded array of regex strings.
    pub patterns: String,
    /// Whether the tag participates in matching.
    pub is_active: bool,
    /// When the tag was created.
    pub created_at: DateTime<Utc>,
}

/// New tag for creation.
#[derive(Debug, Clone)]
pub struct NewTag {
    /// Tag name.
    pub name: String,
    /// Classification type.
    pub tag_type: TagType,
    /// Regex pattern strings.
    pub patterns: Vec<String>,
}

impl NewTag {
    /// Create a new tag.
    pub fn new(name: impl Into<String>, tag_type: TagType) -> Self {
        Self {
            name: name.into(),
            tag_type,
            patterns: Vec::new(),
        }
    }

    /// Add a matching pattern.
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.patterns.push(pattern.into());
        self
    }

    /// Set all matching patterns.
    pub fn with_patterns(mut self, patterns: Vec<String>) -> Self {
        self.patterns = patterns;
        self
    }
}

/// An ingested content item.
#[derive(Debug, Clone)]
pub struct Content {
    /// Content ID.
    pub id: i64,
    /// Owning source.
    pub source_id: i64,
    /// Item title.
    pub title: String,
    /// Item description (HTML stripped).
    pub description: Option<String>,
    /// Canonical URL (unique, the dedup key).
    pub canonical_url: String,
    /// Thumbnail URL.
    pub thumbnail_url: Option<String>,
    /// Content kind, derived from the owning source's kind.
    pub kind: ContentKind,
    /// When the item was published.
    pub published_at: DateTime<Utc>,
    /// Author name.
    pub author: Option<String>,
    /// Feed category terms.
    pub categories: Vec<String>,
    /// When the item was ingested.
    pub created_at: DateTime<Utc>,
}

/// New content item for creation.
#[derive(Debug, Clone)]
pub struct NewContent {
    /// Owning source.
    pub source_id: i64,
    /// Item title.
    pub title: String,
    /// Item description.
    pub description: Option<String>,
    /// Canonical URL.
    pub canonical_url: String,
    /// Thumbnail URL.
    pub thumbnail_url: Option<String>,
    /// Content kind.
    pub kind: ContentKind,
    /// When the item was published.
    pub published_at: DateTime<Utc>,
    /// Author name.
    pub author: Option<String>,
    /// Feed category terms.
    pub categories: Vec<String>,
}

impl NewContent {
    /// Create a new content item.
    pub fn new(
        source_id: i64,
        title: impl Into<String>,
        canonical_url: impl Into<String>,
        kind: ContentKind,
        published_at: DateTime<Utc>,
    ) -> Self {
        Self {
            source_id,
            title: title.into(),
            description: None,
            canonical_url: canonical_url.into(),
            thumbnail_url: None,
            kind,
            published_at,
            author: None,
            categories: Vec::new(),
        }
    }

    /// Set the description, truncated to the storage limit.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let desc = description.into();
        if desc.chars().count() > MAX_DESCRIPTION_LENGTH {
            self.description = Some(desc.chars().take(MAX_DESCRIPTION_LENGTH).collect());
        } else {
            self.description = Some(desc);
        }
        self
    }

    /// Set the thumbnail URL.
    pub fn with_thumbnail_url(mut self, url: impl Into<String>) -> Self {
        self.thumbnail_url = Some(url.into());
        self
    }

    /// Set the author.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Set the category terms.
    pub fn with_categories(mut self, categories: Vec<String>) -> Self {
        self.categories = categories;
        self
    }
}

/// An enclosure attached to a feed item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enclosure {
    /// Enclosure URL.
    pub url: String,
    /// MIME type, if declared.
    pub mime_type: Option<String>,
}

/// A feed item as returned by the fetcher, before extraction.
#[derive(Debug, Clone, Default)]
pub struct RawItem {
    /// RSS guid or Atom id (may be empty).
    pub guid: String,
    /// Item link.
    pub link: Option<String>,
    /// Item title.
    pub title: Option<String>,
    /// Summary / plain-text snippet.
    pub summary: Option<String>,
    /// Raw content body (may contain HTML).
    pub content_body: Option<String>,
    /// Publish timestamp as parsed from the feed.
    pub published_at: Option<DateTime<Utc>>,
    /// First author name.
    pub author: Option<String>,
    /// Feed category terms.
    pub categories: Vec<String>,
    /// Enclosures (url + mime type).
    pub enclosures: Vec<Enclosure>,
    /// Thumbnail URLs from media-RSS / iTunes namespaces, in document order.
    pub media_thumbnails: Vec<String>,
}

/// A feed item after metadata extraction, ready to persist.
#[derive(Debug, Clone)]
pub struct NormalizedItem {
    /// Canonical URL (link, else guid).
    pub canonical_url: String,
    /// Title, never empty.
    pub title: String,
    /// Description, HTML stripped and length capped.
    pub description: Option<String>,
    /// Thumbnail URL chosen by the extraction strategies.
    pub thumbnail_url: Option<String>,
    /// Publish timestamp, defaulted to extraction time when absent.
    pub published_at: DateTime<Utc>,
    /// Content kind, derived from the owning source's kind.
    pub kind: ContentKind,
    /// Author name.
    pub author: Option<String>,
    /// Feed category terms.
    pub categories: Vec<String>,
}
