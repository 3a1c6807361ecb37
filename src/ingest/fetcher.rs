//! Feed fetcher for huddle.
//!
//! Retrieves and parses remote RSS/Atom feeds into raw items with
//! SSRF protection and resource limits. Media-RSS and iTunes namespace
//! data needed for thumbnail extraction is carried through on each item.

use async_trait::async_trait;
use feed_rs::parser;
use reqwest::Client;
use std::net::IpAddr;
use std::time::Duration;

use crate::config::IngestConfig;
use crate::error::{HuddleError, Result};
use crate::ingest::types::{Enclosure, RawItem};

/// User agent string for feed fetching.
const USER_AGENT: &str = "huddle/1.0 (feed ingestion)";

/// A source of raw feed items.
///
/// The orchestrator and scheduler work against this seam so tests can wire
/// in doubles instead of the HTTP fetcher.
#[async_trait]
pub trait FeedSource {
    /// Retrieve and parse the feed at the given URL.
    async fn fetch(&self, url: &str) -> Result<Vec<RawItem>>;
}

/// Feed fetcher with security measures.
pub struct FeedFetcher {
    client: Client,
    max_feed_size: u64,
}

impl FeedFetcher {
    /// Create a new fetcher from the ingestion configuration.
    pub fn new(config: &IngestConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .read_timeout(Duration::from_secs(config.read_timeout_secs))
            .timeout(Duration::from_secs(config.total_timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| HuddleError::Fetch(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            max_feed_size: config.max_feed_size_bytes,
        })
    }
}

#[async_trait]
impl FeedSource for FeedFetcher {
    /// Fetch and parse a feed from the given URL.
    ///
    /// All failure modes (invalid URL, network error, non-2xx status,
    /// oversized body, unparsable document) surface as a fetch error with a
    /// human-readable cause. An empty item list is a valid result.
    async fn fetch(&self, url: &str) -> Result<Vec<RawItem>> {
        validate_url(url)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| HuddleError::Fetch(format!("failed to fetch feed: {}", e)))?;

        if !response.status().is_success() {
            return Err(HuddleError::Fetch(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        if let Some(content_length) = response.content_length() {
            if content_length > self.max_feed_size {
                return Err(HuddleError::Fetch(format!(
                    "feed too large: {} bytes (max {} bytes)",
                    content_length, self.max_feed_size
                )));
            }
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| HuddleError::Fetch(format!("failed to read response: {}", e)))?;

        if bytes.len() as u64 > self.max_feed_size {
            return Err(HuddleError::Fetch(format!(
                "feed too large: {} bytes (max {} bytes)",
                bytes.len(),
                self.max_feed_size
            )));
        }

        parse_feed(&bytes)
    }
}

/// Validate a URL before fetching.
///
/// Only http/https URLs with a public host are accepted; private and
/// reserved addresses are rejected to keep operator-supplied feed URLs from
/// reaching internal services.
pub fn validate_url(url: &str) -> Result<()> {
    let parsed =
        url::Url::parse(url).map_err(|e| HuddleError::Fetch(format!("invalid URL: {}", e)))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(HuddleError::Fetch(format!(
                "unsupported URL scheme: {}",
                scheme
            )));
        }
    }

    let host = parsed
        .host()
        .ok_or_else(|| HuddleError::Fetch("URL has no host".to_string()))?;

    match host {
        url::Host::Domain(domain) => {
            if is_forbidden_hostname(domain) {
                return Err(HuddleError::Fetch(format!("forbidden host: {}", domain)));
            }
        }
        url::Host::Ipv4(ipv4) => {
            if is_private_ip(&IpAddr::V4(ipv4)) {
                return Err(HuddleError::Fetch(format!(
                    "private IP address not allowed: {}",
                    ipv4
                )));
            }
        }
        url::Host::Ipv6(ipv6) => {
            if is_private_ip(&IpAddr::V6(ipv6)) {
                return Err(HuddleError::Fetch(format!(
                    "private IP address not allowed: {}",
                    ipv6
                )));
            }
        }
    }

    Ok(())
}

/// Check if a hostname points at a local or internal network.
fn is_forbidden_hostname(host: &str) -> bool {
    let host = host.to_lowercase();
    if host == "localhost" {
        return true;
    }
    [".local", ".localhost", ".internal", ".intranet", ".corp", ".home", ".lan"]
        .iter()
        .any(|suffix| host.ends_with(suffix))
}

/// Check if an IP address is private/reserved.
fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            let octets = v4.octets();
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_broadcast()
                || v4.is_unspecified()
                // Documentation ranges: 192.0.2.0/24, 198.51.100.0/24, 203.0.113.0/24
                || (octets[0] == 192 && octets[1] == 0 && octets[2] == 2)
                || (octets[0] == 198 && octets[1] == 51 && octets[2] == 100)
                || (octets[0] == 203 && octets[1] == 0 && octets[2] == 113)
        }
        IpAddr::V6(v6) => {
            let segments = v6.segments();
            v6.is_loopback()
                || v6.is_unspecified()
                // Unique local: fc00::/7
                || (segments[0] & 0xfe00) == 0xfc00
                // Link-local: fe80::/10
                || (segments[0] & 0xffc0) == 0xfe80
        }
    }
}

/// Parse feed bytes into raw items.
///
/// Items are returned in the order the feed lists them.
pub fn parse_feed(bytes: &[u8]) -> Result<Vec<RawItem>> {
    let feed = parser::parse(bytes)
        .map_err(|e| HuddleError::Fetch(format!("failed to parse feed: {}", e)))?;

    Ok(feed.entries.into_iter().map(raw_item_from_entry).collect())
}

/// Convert a feed-rs entry into a RawItem.
fn raw_item_from_entry(entry: feed_rs::model::Entry) -> RawItem {
    // The alternate link is the item's page; enclosure links are collected
    // separately below.
    let link = entry
        .links
        .iter()
        .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
        .or_else(|| entry.links.first())
        .map(|l| l.href.clone());

    let mut enclosures = Vec::new();
    for l in &entry.links {
        if l.rel.as_deref() == Some("enclosure") {
            enclosures.push(Enclosure {
                url: l.href.clone(),
                mime_type: l.media_type.clone(),
            });
        }
    }

    // feed-rs normalizes RSS enclosures, media:content and iTunes data into
    // media objects; thumbnails cover media:group, media:thumbnail and the
    // iTunes episode image.
    let mut media_thumbnails = Vec::new();
    for media in &entry.media {
        for content in &media.content {
            if let Some(url) = &content.url {
                enclosures.push(Enclosure {
                    url: url.to_string(),
                    mime_type: content.content_type.as_ref().map(|m| m.to_string()),
                });
            }
        }
        for thumbnail in &media.thumbnails {
            media_thumbnails.push(thumbnail.image.uri.clone());
        }
    }

    let content_body = entry.content.as_ref().and_then(|c| c.body.clone());
    if let Some(src) = entry.content.as_ref().and_then(|c| c.src.as_ref()) {
        if !src.href.trim().is_empty() {
            enclosures.push(Enclosure {
                url: src.href.clone(),
                mime_type: src.media_type.clone(),
            });
        }
    }

    RawItem {
        guid: entry.id,
        link,
        title: entry.title.map(|t| t.content),
        summary: entry.summary.map(|t| t.content),
        content_body,
        published_at: entry.published.or(entry.updated),
        author: entry.authors.first().map(|a| a.name.clone()),
        categories: entry
            .categories
            .iter()
            .map(|c| c.term.clone())
            .filter(|t| !t.is_empty())
            .collect(),
        enclosures,
        media_thumbnails,
    }
}
