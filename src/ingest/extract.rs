//! Metadata extraction for huddle.
//!
//! Turns a raw feed item into a normalized record ready for tagging and
//! persistence. Extraction strategies run in a fixed priority order; an
//! item is only rejected when it has no usable canonical URL.

use chrono::Utc;
use regex::Regex;
use std::sync::OnceLock;

use crate::ingest::types::{
    NormalizedItem, RawItem, SourceKind, MAX_DESCRIPTION_LENGTH, UNTITLED_PLACEHOLDER,
};

/// Extract a normalized record from a raw feed item.
///
/// Returns `None` when the item has neither a link nor a guid; callers log
/// and skip such items without failing the cycle.
pub fn extract(item: &RawItem, source_kind: SourceKind) -> Option<NormalizedItem> {
    // Canonical URL: link if present, else guid. This is the dedup key.
    let canonical_url = item
        .link
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .or_else(|| {
            let guid = item.guid.trim();
            (!guid.is_empty()).then(|| guid.to_string())
        })?;

    // Missing titles never reject an item.
    let title = item
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .unwrap_or_else(|| UNTITLED_PLACEHOLDER.to_string());

    // Unparsable or absent publish dates default to "now", never null.
    let published_at = item.published_at.unwrap_or_else(Utc::now);

    let description = [item.summary.as_deref(), item.content_body.as_deref()]
        .into_iter()
        .flatten()
        .map(strip_html)
        .find(|text| !text.is_empty())
        .map(|text| truncate_chars(&text, MAX_DESCRIPTION_LENGTH));

    let thumbnail_url = extract_thumbnail(item, source_kind);

    let author = item
        .author
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(String::from);

    Some(NormalizedItem {
        canonical_url,
        title,
        description,
        thumbnail_url,
        published_at,
        kind: source_kind.content_kind(),
        author,
        categories: item.categories.clone(),
    })
}

/// Pick a thumbnail URL, first non-empty strategy wins:
///
/// 1. media thumbnails when the source is a video channel (media:group)
/// 2. an enclosure whose MIME type is an image
/// 3. media thumbnails for any source kind (media:thumbnail / iTunes image)
/// 4. the first `<img src>` found in the raw content body or summary
fn extract_thumbnail(item: &RawItem, source_kind: SourceKind) -> Option<String> {
    let media_thumbnail = item
        .media_thumbnails
        .iter()
        .map(|t| t.trim())
        .find(|t| !t.is_empty())
        .map(String::from);

    if source_kind == SourceKind::VideoChannel {
        if let Some(thumb) = &media_thumbnail {
            return Some(thumb.clone());
        }
    }

    if let Some(enclosure) = item.enclosures.iter().find(|e| {
        !e.url.trim().is_empty()
            && e.mime_type
                .as_deref()
                .map(|m| m.starts_with("image/"))
                .unwrap_or(false)
    }) {
        return Some(enclosure.url.trim().to_string());
    }

    if let Some(thumb) = media_thumbnail {
        return Some(thumb);
    }

    [item.content_body.as_deref(), item.summary.as_deref()]
        .into_iter()
        .flatten()
        .find_map(extract_image_from_html)
}

/// Scan HTML for the first `<img src="...">` value.
fn extract_image_from_html(html: &str) -> Option<String> {
    static IMG_RE: OnceLock<Regex> = OnceLock::new();
    let re = IMG_RE.get_or_init(|| {
        Regex::new(r#"(?i)<img[^>]+src\s*=\s*["']([^"'\s>]+)["']"#).expect("img regex")
    });
    re.captures(html).map(|caps| caps[1].to_string())
}

/// Strip HTML tags, decode common entities and collapse whitespace.
pub fn strip_html(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut chars = html.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '<' => {
                // Drop everything up to the closing bracket
                for c in chars.by_ref() {
                    if c == '>' {
                        break;
                    }
                }
            }
            '&' => {
                let mut entity = String::new();
                let mut terminated = false;
                while let Some(&c) = chars.peek() {
                    if c == ';' {
                        chars.next();
                        terminated = true;
                        break;
                    }
                    if entity.len() >= 10 || c == '&' || c == '<' || c.is_whitespace() {
                        break;
                    }
                    entity.push(c);
                    chars.next();
                }
                if terminated {
                    match decode_entity(&entity) {
                        Some(decoded) => out.push_str(&decoded),
                        None => {
                            out.push('&');
                            out.push_str(&entity);
                            out.push(';');
                        }
                    }
                } else {
                    out.push('&');
                    out.push_str(&entity);
                }
            }
            _ => out.push(ch),
        }
    }

    out.split_whitespace().collect::<Vec<&str>>().join(" ")
}

/// Decode a single HTML entity name (without `&` and `;`).
fn decode_entity(entity: &str) -> Option<String> {
    match entity {
        "amp" => Some("&".to_string()),
        "lt" => Some("<".to_string()),
        "gt" => Some(">".to_string()),
        "quot" => Some("\"".to_string()),
        "apos" | "#39" => Some("'".to_string()),
        "nbsp" => Some(" ".to_string()),
        _ if entity.starts_with("#x") || entity.starts_with("#X") => {
            u32::from_str_radix(&entity[2..], 16)
                .ok()
                .and_then(char::from_u32)
                .map(String::from)
        }
        _ if entity.starts_with('#') => entity[1..]
            .parse::<u32>()
            .ok()
            .and_then(char::from_u32)
            .map(String::from),
        _ => None,
    }
}

/// Truncate to a maximum number of characters.
fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        text.chars().take(max).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::{ContentKind, Enclosure};
    use chrono::{TimeZone, Utc};

    fn item_with_link(link: &str) -> RawItem {
        RawItem {
            link: Some(link.to_string()),
            ..RawItem::default()
        }
    }

    #[test]
    fn test_canonical_url_prefers_link() {
        let item = RawItem {
            guid: "guid-1".to_string(),
            link: Some("https://example.com/article".to_string()),
            ..RawItem::default()
        };
        let normalized = extract(&item, SourceKind::Rss).unwrap();
        assert_eq!(normalized.canonical_url, "https://example.com/article");
    }

    #[test]
    fn test_canonical_url_falls_back_to_guid() {
        let item = RawItem {
            guid: "https://example.com/guid-url".to_string(),
            ..RawItem::default()
        };
        let normalized = extract(&item, SourceKind::Rss).unwrap();
        assert_eq!(normalized.canonical_url, "https://example.com/guid-url");
    }

    #[test]
    fn test_item_without_link_or_guid_is_rejected() {
        let item = RawItem::default();
        assert!(extract(&item, SourceKind::Rss).is_none());
    }

    #[test]
    fn test_missing_title_gets_placeholder() {
        let item = item_with_link("https://example.com/a");
        let normalized = extract(&item, SourceKind::Rss).unwrap();
        assert_eq!(normalized.title, UNTITLED_PLACEHOLDER);
    }

    #[test]
    fn test_missing_publish_date_defaults_to_now() {
        let item = item_with_link("https://example.com/a");
        let before = Utc::now();
        let normalized = extract(&item, SourceKind::Rss).unwrap();
        assert!(normalized.published_at >= before);
    }

    #[test]
    fn test_publish_date_is_kept_when_present() {
        let published = Utc.with_ymd_and_hms(2024, 11, 4, 12, 0, 0).unwrap();
        let item = RawItem {
            link: Some("https://example.com/a".to_string()),
            published_at: Some(published),
            ..RawItem::default()
        };
        let normalized = extract(&item, SourceKind::Rss).unwrap();
        assert_eq!(normalized.published_at, published);
    }

    #[test]
    fn test_description_prefers_summary_then_body() {
        let item = RawItem {
            link: Some("https://example.com/a".to_string()),
            summary: Some("<p>Short snippet</p>".to_string()),
            content_body: Some("<p>Full body</p>".to_string()),
            ..RawItem::default()
        };
        let normalized = extract(&item, SourceKind::Rss).unwrap();
        assert_eq!(normalized.description.as_deref(), Some("Short snippet"));

        let body_only = RawItem {
            link: Some("https://example.com/a".to_string()),
            summary: Some("   ".to_string()),
            content_body: Some("<p>Full body</p>".to_string()),
            ..RawItem::default()
        };
        let normalized = extract(&body_only, SourceKind::Rss).unwrap();
        assert_eq!(normalized.description.as_deref(), Some("Full body"));

        let neither = item_with_link("https://example.com/a");
        let normalized = extract(&neither, SourceKind::Rss).unwrap();
        assert!(normalized.description.is_none());
    }

    #[test]
    fn test_content_kind_follows_source_kind() {
        let item = item_with_link("https://example.com/a");
        assert_eq!(
            extract(&item, SourceKind::Rss).unwrap().kind,
            ContentKind::Article
        );
        assert_eq!(
            extract(&item, SourceKind::VideoChannel).unwrap().kind,
            ContentKind::Video
        );
        assert_eq!(
            extract(&item, SourceKind::AudioFeed).unwrap().kind,
            ContentKind::Audio
        );
    }

    #[test]
    fn test_thumbnail_media_group_beats_enclosure_for_video() {
        let item = RawItem {
            link: Some("https://example.com/v".to_string()),
            media_thumbnails: vec!["https://example.com/thumb.jpg".to_string()],
            enclosures: vec![Enclosure {
                url: "https://example.com/still.png".to_string(),
                mime_type: Some("image/png".to_string()),
            }],
            ..RawItem::default()
        };
        let normalized = extract(&item, SourceKind::VideoChannel).unwrap();
        assert_eq!(
            normalized.thumbnail_url.as_deref(),
            Some("https://example.com/thumb.jpg")
        );
    }

    #[test]
    fn test_thumbnail_image_enclosure_beats_media_thumbnail_for_articles() {
        let item = RawItem {
            link: Some("https://example.com/a".to_string()),
            media_thumbnails: vec!["https://example.com/thumb.jpg".to_string()],
            enclosures: vec![Enclosure {
                url: "https://example.com/hero.png".to_string(),
                mime_type: Some("image/png".to_string()),
            }],
            ..RawItem::default()
        };
        let normalized = extract(&item, SourceKind::Rss).unwrap();
        assert_eq!(
            normalized.thumbnail_url.as_deref(),
            Some("https://example.com/hero.png")
        );
    }

    #[test]
    fn test_thumbnail_non_image_enclosure_is_ignored() {
        let item = RawItem {
            link: Some("https://example.com/a".to_string()),
            media_thumbnails: vec!["https://example.com/thumb.jpg".to_string()],
            enclosures: vec![Enclosure {
                url: "https://example.com/ep.mp3".to_string(),
                mime_type: Some("audio/mpeg".to_string()),
            }],
            ..RawItem::default()
        };
        let normalized = extract(&item, SourceKind::AudioFeed).unwrap();
        assert_eq!(
            normalized.thumbnail_url.as_deref(),
            Some("https://example.com/thumb.jpg")
        );
    }

    #[test]
    fn test_thumbnail_img_tag_fallback() {
        let item = RawItem {
            link: Some("https://example.com/a".to_string()),
            content_body: Some(
                r#"<p>Recap</p><img class="hero" src="https://example.com/inline.jpg" alt="">"#
                    .to_string(),
            ),
            ..RawItem::default()
        };
        let normalized = extract(&item, SourceKind::Rss).unwrap();
        assert_eq!(
            normalized.thumbnail_url.as_deref(),
            Some("https://example.com/inline.jpg")
        );
    }

    #[test]
    fn test_thumbnail_none_when_no_strategy_matches() {
        let item = RawItem {
            link: Some("https://example.com/a".to_string()),
            content_body: Some("<p>No images here</p>".to_string()),
            ..RawItem::default()
        };
        let normalized = extract(&item, SourceKind::Rss).unwrap();
        assert!(normalized.thumbnail_url.is_none());
    }

    #[test]
    fn test_strip_html_tags_and_entities() {
        assert_eq!(strip_html("<p>Hello</p>"), "Hello");
        assert_eq!(strip_html("<b>Bold</b> text"), "Bold text");
        assert_eq!(strip_html("&amp;"), "&");
        assert_eq!(strip_html("&lt;tag&gt;"), "<tag>");
        assert_eq!(strip_html("A&nbsp;B"), "A B");
        assert_eq!(strip_html("&#65;"), "A");
        assert_eq!(strip_html("&#x41;"), "A");
        assert_eq!(strip_html("&unknown;"), "&unknown;");
    }

    #[test]
    fn test_strip_html_collapses_whitespace() {
        assert_eq!(
            strip_html("<p>  Multiple   spaces  </p>"),
            "Multiple spaces"
        );
        assert_eq!(
            strip_html("<p>\n\tNewlines\n\tand\ttabs\n</p>"),
            "Newlines and tabs"
        );
    }

    #[test]
    fn test_description_is_truncated() {
        let item = RawItem {
            link: Some("https://example.com/a".to_string()),
            summary: Some("a".repeat(MAX_DESCRIPTION_LENGTH + 500)),
            ..RawItem::default()
        };
        let normalized = extract(&item, SourceKind::Rss).unwrap();
        assert_eq!(
            normalized.description.unwrap().chars().count(),
            MAX_DESCRIPTION_LENGTH
        );
    }
}
