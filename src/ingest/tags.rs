//! Tag matching for huddle.
//!
//! Holds a compiled dictionary of (tag, pattern set) pairs and classifies a
//! title+description pair into tag identifiers. The dictionary is loaded
//! once before any batch runs and is immutable for the duration of a batch;
//! reloading swaps the compiled set atomically.

use regex::{Regex, RegexBuilder};
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

use crate::error::{HuddleError, Result};
use crate::ingest::repository::TagRepository;
use crate::ingest::types::Tag;

/// One tag with its compiled patterns.
#[derive(Debug)]
struct CompiledTag {
    id: i64,
    name: String,
    patterns: Vec<Regex>,
}

/// An immutable compiled tag dictionary.
#[derive(Debug, Default)]
pub struct TagDictionary {
    tags: Vec<CompiledTag>,
}

impl TagDictionary {
    /// Compile a dictionary from tag rows, in row order.
    ///
    /// Tags whose pattern list is empty or unparsable are skipped, as are
    /// individual patterns that fail to compile. Every pattern is compiled
    /// case-insensitively.
    pub fn compile(rows: &[Tag]) -> Self {
        let mut tags = Vec::with_capacity(rows.len());

        for row in rows {
            let patterns: Vec<String> = match serde_json::from_str(&row.patterns) {
                Ok(patterns) => patterns,
                Err(e) => {
                    warn!(tag = %row.name, error = %e, "skipping tag with unparsable pattern list");
                    continue;
                }
            };
            if patterns.is_empty() {
                debug!(tag = %row.name, "skipping tag with empty pattern list");
                continue;
            }

            let mut compiled = Vec::with_capacity(patterns.len());
            for pattern in &patterns {
                match RegexBuilder::new(pattern).case_insensitive(true).build() {
                    Ok(re) => compiled.push(re),
                    Err(e) => {
                        warn!(tag = %row.name, pattern = %pattern, error = %e, "skipping invalid tag pattern");
                    }
                }
            }
            if compiled.is_empty() {
                continue;
            }

            tags.push(CompiledTag {
                id: row.id,
                name: row.name.clone(),
                patterns: compiled,
            });
        }

        Self { tags }
    }

    /// Classify a title+description pair into tag identifiers.
    ///
    /// Tags are tested in dictionary order. The first matching pattern
    /// records the tag and short-circuits the rest of that tag's set, so a
    /// tag appears at most once per item.
    pub fn match_tags(&self, title: &str, description: &str) -> Vec<i64> {
        let blob = format!("{} {}", title, description);
        self.tags
            .iter()
            .filter(|tag| tag.patterns.iter().any(|re| re.is_match(&blob)))
            .map(|tag| tag.id)
            .collect()
    }

    /// Number of usable tags in the dictionary.
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Whether the dictionary has no usable tags.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Names of the compiled tags, in dictionary order.
    pub fn tag_names(&self) -> Vec<&str> {
        self.tags.iter().map(|t| t.name.as_str()).collect()
    }
}

/// Thread-safe handle around the compiled dictionary.
///
/// Matching before the dictionary has been loaded is a programming error
/// and fails loudly rather than silently under-tagging a batch.
pub struct TagMatcher {
    inner: RwLock<Option<Arc<TagDictionary>>>,
}

impl TagMatcher {
    /// Create a matcher with no dictionary loaded.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(None),
        }
    }

    /// Load (or reload) the dictionary from the tag table.
    ///
    /// Returns the number of usable tags. The previous dictionary, if any,
    /// stays in effect until the new one is swapped in.
    pub async fn load(&self, repo: &TagRepository<'_>) -> Result<usize> {
        let rows = repo.list_active().await?;
        Ok(self.install(&rows))
    }

    /// Compile and install a dictionary from already-loaded rows.
    pub fn install(&self, rows: &[Tag]) -> usize {
        let dictionary = Arc::new(TagDictionary::compile(rows));
        let count = dictionary.len();
        let mut guard = match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = Some(dictionary);
        count
    }

    /// Whether a dictionary has been loaded.
    pub fn is_loaded(&self) -> bool {
        let guard = match self.inner.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.is_some()
    }

    /// Get the current dictionary snapshot.
    ///
    /// Fails with a `TagDictionary` error when called before `load`.
    pub fn current(&self) -> Result<Arc<TagDictionary>> {
        let guard = match self.inner.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.clone().ok_or_else(|| {
            HuddleError::TagDictionary(
                "load must complete before matching; refusing to silently return no tags"
                    .to_string(),
            )
        })
    }

    /// Classify a title+description pair using the current dictionary.
    pub fn match_tags(&self, title: &str, description: &str) -> Result<Vec<i64>> {
        Ok(self.current()?.match_tags(title, description))
    }
}

impl Default for TagMatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::TagType;
    use chrono::Utc;

    fn tag(id: i64, name: &str, patterns: &str) -> Tag {
        Tag {
            id,
            name: name.to_string(),
            tag_type: TagType::Keyword,
            patterns: patterns.to_string(),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_compile_skips_unparsable_and_empty_pattern_lists() {
        let rows = vec![
            tag(1, "good", r#"["\\bchiefs\\b"]"#),
            tag(2, "empty", "[]"),
            tag(3, "broken-json", "not json"),
            tag(4, "bad-regex", r#"["("]"#),
        ];
        let dict = TagDictionary::compile(&rows);
        assert_eq!(dict.len(), 1);
        assert_eq!(dict.tag_names(), vec!["good"]);
    }

    #[test]
    fn test_match_is_case_insensitive() {
        let rows = vec![tag(1, "chiefs", r#"["\\bchiefs\\b"]"#)];
        let dict = TagDictionary::compile(&rows);
        assert_eq!(dict.match_tags("CHIEFS clinch the division", ""), vec![1]);
        assert_eq!(dict.match_tags("Chiefs clinch", ""), vec![1]);
        assert!(dict.match_tags("Jets clinch", "").is_empty());
    }

    #[test]
    fn test_tag_with_two_matching_patterns_is_recorded_once() {
        let rows = vec![tag(
            7,
            "mahomes",
            r#"["\\bmahomes\\b", "\\bpatrick\\b"]"#,
        )];
        let dict = TagDictionary::compile(&rows);
        let matched = dict.match_tags("Patrick Mahomes leads comeback", "");
        assert_eq!(matched, vec![7]);
    }

    #[test]
    fn test_match_covers_title_and_description() {
        let rows = vec![
            tag(1, "injury", r#"["\\binjur"]"#),
            tag(2, "waivers", r#"["\\bwaiver"]"#),
        ];
        let dict = TagDictionary::compile(&rows);
        let matched = dict.match_tags("Week 10 news", "Two injuries shake up waiver priority");
        assert_eq!(matched, vec![1, 2]);
    }

    #[test]
    fn test_dictionary_order_is_row_order() {
        let rows = vec![
            tag(5, "b", r#"["x"]"#),
            tag(2, "a", r#"["x"]"#),
        ];
        let dict = TagDictionary::compile(&rows);
        assert_eq!(dict.match_tags("x", ""), vec![5, 2]);
    }

    #[test]
    fn test_match_before_load_fails_loudly() {
        let matcher = TagMatcher::new();
        assert!(!matcher.is_loaded());
        let result = matcher.match_tags("title", "description");
        assert!(matches!(result, Err(HuddleError::TagDictionary(_))));
    }

    #[test]
    fn test_install_and_match() {
        let matcher = TagMatcher::new();
        let count = matcher.install(&[tag(1, "chiefs", r#"["\\bchiefs\\b"]"#)]);
        assert_eq!(count, 1);
        assert!(matcher.is_loaded());
        assert_eq!(matcher.match_tags("Chiefs win", "").unwrap(), vec![1]);
    }

    #[test]
    fn test_reload_swaps_dictionary() {
        let matcher = TagMatcher::new();
        matcher.install(&[tag(1, "chiefs", r#"["\\bchiefs\\b"]"#)]);
        assert_eq!(matcher.match_tags("chiefs", "").unwrap(), vec![1]);

        matcher.install(&[tag(2, "eagles", r#"["\\beagles\\b"]"#)]);
        assert!(matcher.match_tags("chiefs", "").unwrap().is_empty());
        assert_eq!(matcher.match_tags("eagles", "").unwrap(), vec![2]);
    }
}
