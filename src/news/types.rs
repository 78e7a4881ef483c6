//! News types for newsbot.

use chrono::{DateTime, Utc};

use crate::subscription::SourceKind;

/// Maximum description length in characters before truncation.
pub const MAX_DESCRIPTION_CHARS: usize = 200;

/// Appended to a truncated description.
pub const TRUNCATION_MARKER: &str = "...";

/// An entry as read from a source, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    /// Entry title.
    pub title: String,
    /// Link to the full article.
    pub link: String,
    /// Stable identity within the source: the link for feeds,
    /// the announcement code for announcements.
    pub identity: String,
    /// Description or summary, possibly containing markup.
    pub description: Option<String>,
    /// Publication time if the source provides one.
    pub published: Option<DateTime<Utc>>,
    /// Kind of the originating source.
    pub kind: SourceKind,
    /// Name of the originating source.
    pub source_name: String,
}

/// A normalized news item produced once per cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsRecord {
    /// Plain-text title.
    pub title: String,
    /// Link to the full article.
    pub link: String,
    /// Plain-text description, at most 200 characters plus marker.
    pub description: String,
    /// Publication time, defaulting to fetch time.
    pub published: DateTime<Utc>,
    /// SHA-256 hex fingerprint used as the dedup key.
    pub hash: String,
    /// Kind of the originating source.
    pub kind: SourceKind,
    /// Name of the originating source.
    pub source_name: String,
}
