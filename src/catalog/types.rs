//! Catalog types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One contributor registered in the source registry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SourceEntry {
    /// Repository URL, e.g. `https://github.com/owner/repo`.
    #[serde(rename = "repo")]
    pub repository_path: String,
    /// Branch whose content is authoritative.
    pub branch: String,
}

impl SourceEntry {
    /// Create a new source entry.
    pub fn new(repository_path: impl Into<String>, branch: impl Into<String>) -> Self {
        Self {
            repository_path: repository_path.into(),
            branch: branch.into(),
        }
    }
}

/// Alternate title of a book.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct OtherName {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub romaji: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub english: Option<String>,
}

impl OtherName {
    /// An alternate name carrying only a romaji title.
    pub fn romaji(value: impl Into<String>) -> Self {
        Self {
            romaji: Some(value.into()),
            ..Default::default()
        }
    }
}

/// A book as listed in a contributor's watchlist.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BookRecord {
    /// Display name.
    pub name: String,
    /// Alternate titles, in listed order.
    #[serde(rename = "other", default)]
    pub other_names: Vec<OtherName>,
    /// Cover image URL.
    #[serde(rename = "cover")]
    pub cover_image_url: String,
}

impl BookRecord {
    /// Create a book with no alternate names.
    pub fn new(name: impl Into<String>, cover_image_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            other_names: Vec::new(),
            cover_image_url: cover_image_url.into(),
        }
    }

    /// Append an alternate name.
    pub fn with_other_name(mut self, other: OtherName) -> Self {
        self.other_names.push(other);
        self
    }

    /// First non-empty romaji alternate, in listed order.
    pub fn romaji(&self) -> Option<&str> {
        self.other_names
            .iter()
            .filter_map(|o| o.romaji.as_deref())
            .find(|r| !r.is_empty())
    }
}

/// A located RSS feed, ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessedFeed {
    /// Book display name, never sanitized.
    pub title: String,
    /// Cover image URL.
    pub cover_image_url: String,
    /// Canonical RSS URL.
    pub feed_url: String,
    /// Owner of the source repository.
    pub source_owner: String,
    /// Name of the source repository.
    pub source_repository: String,
}

impl ProcessedFeed {
    /// Web page of the source repository.
    pub fn source_url(&self) -> String {
        format!(
            "https://github.com/{}/{}",
            self.source_owner, self.source_repository
        )
    }

    /// Avatar image of the source owner.
    pub fn avatar_url(&self) -> String {
        format!("https://github.com/{}.png", self.source_owner)
    }
}

/// A source left out of a best-effort run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedSource {
    /// Repository path as listed in the registry.
    pub repository: String,
    /// Why it was skipped.
    pub reason: String,
}

/// Result of one aggregation run.
#[derive(Debug, Clone, Serialize)]
pub struct Catalog {
    /// Feeds in registry-then-watchlist order.
    pub feeds: Vec<ProcessedFeed>,
    /// Sources skipped in best-effort mode. Always empty in strict mode.
    pub skipped: Vec<SkippedSource>,
    /// When the run finished.
    pub generated_at: DateTime<Utc>,
}

impl Catalog {
    /// Create a catalog stamped with the current time.
    pub fn new(feeds: Vec<ProcessedFeed>, skipped: Vec<SkippedSource>) -> Self {
        Self {
            feeds,
            skipped,
            generated_at: Utc::now(),
        }
    }

    /// Empty catalog.
    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new())
    }
}
