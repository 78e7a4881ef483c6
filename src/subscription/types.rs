//! Subscription types for newsbot.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Kind of a news source, deciding how it is fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// RSS or Atom feed fetched with GET.
    #[default]
    Rss,
    /// Exchange announcement API queried with a JSON POST.
    ExchangeAnnouncements,
}

impl SourceKind {
    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Rss => "rss",
            SourceKind::ExchangeAnnouncements => "exchange_announcements",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rss" => Ok(SourceKind::Rss),
            "exchange_announcements" => Ok(SourceKind::ExchangeAnnouncements),
            _ => Err(format!("unknown source kind: {s}")),
        }
    }
}

/// A news source shared by all users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    /// Source ID.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Feed or endpoint URL.
    pub url: String,
    /// How the source is fetched.
    pub kind: SourceKind,
    /// Whether the source is polled.
    pub is_active: bool,
    /// When the source was added.
    pub added_at: DateTime<Utc>,
    /// Last successful fetch.
    pub last_fetch_at: Option<DateTime<Utc>>,
}

/// New source for creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSource {
    /// Display name.
    pub name: String,
    /// Feed or endpoint URL.
    pub url: String,
    /// How the source is fetched.
    pub kind: SourceKind,
}

impl NewSource {
    /// Create a new RSS source.
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            kind: SourceKind::Rss,
        }
    }

    /// Set the source kind.
    pub fn with_kind(mut self, kind: SourceKind) -> Self {
        self.kind = kind;
        self
    }
}

/// Result of adding a batch of keywords.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddKeywordsOutcome {
    /// Keywords stored, case-folded.
    pub added: Vec<String>,
    /// Keywords already present or repeated in the batch.
    pub skipped: Vec<String>,
    /// Rejected input with the reason.
    pub invalid: Vec<(String, String)>,
}

impl AddKeywordsOutcome {
    /// Whether nothing was stored.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
    }
}
