//! Keyword and source repositories for newsbot.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::warn;

use super::types::{NewSource, Source, SourceKind};
use crate::datetime::{parse_datetime, to_sql_datetime};
use crate::{NewsbotError, Result};

const SOURCE_COLUMNS: &str = "id, name, url, kind, is_active, added_at, last_fetch_at";

/// Row type for a source from the database.
#[derive(Debug, Clone, sqlx::FromRow)]
struct SourceRow {
    id: i64,
    name: String,
    url: String,
    kind: String,
    is_active: bool,
    added_at: String,
    last_fetch_at: Option<String>,
}

impl From<SourceRow> for Source {
    fn from(row: SourceRow) -> Self {
        let kind = row.kind.parse().unwrap_or_else(|e| {
            warn!("source {}: {}, treating as rss", row.id, e);
            SourceKind::Rss
        });
        Source {
            id: row.id,
            name: row.name,
            url: row.url,
            kind,
            is_active: row.is_active,
            added_at: parse_datetime(&row.added_at).unwrap_or_else(Utc::now),
            last_fetch_at: row.last_fetch_at.as_deref().and_then(parse_datetime),
        }
    }
}

/// Repository for per-user keywords.
///
/// Words are stored exactly as given; callers case-fold before storing.
pub struct KeywordRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> KeywordRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// List a user's keywords in insertion order.
    pub async fn list(&self, user_id: i64) -> Result<Vec<String>> {
        let words = sqlx::query_scalar("SELECT word FROM keywords WHERE user_id = ? ORDER BY id")
            .bind(user_id)
            .fetch_all(self.pool)
            .await?;
        Ok(words)
    }

    /// Count a user's keywords.
    pub async fn count(&self, user_id: i64) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM keywords WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Add a keyword. Returns false if the user already has it.
    pub async fn add(&self, user_id: i64, word: &str) -> Result<bool> {
        let result = sqlx::query("INSERT OR IGNORE INTO keywords (user_id, word) VALUES (?, ?)")
            .bind(user_id)
            .bind(word)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove a keyword. Returns false if it did not exist.
    pub async fn remove(&self, user_id: i64, word: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM keywords WHERE user_id = ? AND word = ?")
            .bind(user_id)
            .bind(word)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove all of a user's keywords. Returns the number removed.
    pub async fn clear(&self, user_id: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM keywords WHERE user_id = ?")
            .bind(user_id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

/// Repository for news sources.
pub struct SourceRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> SourceRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a source by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Source>> {
        let row = sqlx::query_as::<_, SourceRow>(&format!(
            "SELECT {SOURCE_COLUMNS} FROM sources WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(Source::from))
    }

    /// Get a source by URL, active or not.
    pub async fn get_by_url(&self, url: &str) -> Result<Option<Source>> {
        let row = sqlx::query_as::<_, SourceRow>(&format!(
            "SELECT {SOURCE_COLUMNS} FROM sources WHERE url = ?"
        ))
        .bind(url)
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(Source::from))
    }

    /// List active sources in insertion order.
    pub async fn list_active(&self) -> Result<Vec<Source>> {
        let rows = sqlx::query_as::<_, SourceRow>(&format!(
            "SELECT {SOURCE_COLUMNS} FROM sources WHERE is_active = 1 ORDER BY id ASC"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(Source::from).collect())
    }

    /// Count all sources, including inactive ones.
    pub async fn count(&self) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM sources")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Insert a source, or reactivate and rename an existing one with the same URL.
    pub async fn upsert_active(&self, source: &NewSource) -> Result<Source> {
        sqlx::query(
            "INSERT INTO sources (name, url, kind) VALUES (?, ?, ?)
             ON CONFLICT(url) DO UPDATE SET
                 name = excluded.name,
                 kind = excluded.kind,
                 is_active = 1",
        )
        .bind(&source.name)
        .bind(&source.url)
        .bind(source.kind.as_str())
        .execute(self.pool)
        .await?;

        self.get_by_url(&source.url)
            .await?
            .ok_or_else(|| NewsbotError::NotFound("source".to_string()))
    }

    /// Soft-delete a source. Returns false if no active source has this ID.
    pub async fn deactivate(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("UPDATE sources SET is_active = 0 WHERE id = ? AND is_active = 1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Record a successful fetch.
    pub async fn update_last_fetch(&self, id: i64, at: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE sources SET last_fetch_at = ? WHERE id = ?")
            .bind(to_sql_datetime(&at))
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Insert the given sources if the table is empty.
    ///
    /// Returns the number of sources inserted.
    pub async fn seed(&self, sources: &[NewSource]) -> Result<usize> {
        if self.count().await? > 0 {
            return Ok(0);
        }
        for source in sources {
            self.upsert_active(source).await?;
        }
        Ok(sources.len())
    }
}
