//! Per-user record of delivered fingerprints.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::datetime::to_sql_datetime;
use crate::Result;

/// Repository for the seen-set.
pub struct SeenRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> SeenRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Whether the user has already been sent this record.
    pub async fn is_seen(&self, user_id: i64, hash: &str) -> Result<bool> {
        let seen: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM seen_news WHERE user_id = ? AND news_hash = ?)",
        )
        .bind(user_id)
        .bind(hash)
        .fetch_one(self.pool)
        .await?;
        Ok(seen)
    }

    /// Mark a record as delivered. Marking twice is a no-op.
    pub async fn mark_seen(&self, user_id: i64, hash: &str, at: DateTime<Utc>) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO seen_news (user_id, news_hash, seen_at) VALUES (?, ?, ?)")
            .bind(user_id)
            .bind(hash)
            .bind(to_sql_datetime(&at))
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Delete seen records older than `cutoff`. Returns the number deleted.
    pub async fn prune_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM seen_news WHERE seen_at < ?")
            .bind(to_sql_datetime(&cutoff))
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Number of seen records held for a user.
    pub async fn count_for_user(&self, user_id: i64) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM seen_news WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::UserRepository;
    use crate::Database;
    use chrono::{Duration, TimeZone};

    #[tokio::test]
    async fn test_mark_and_check() {
        let db = Database::open_in_memory().await.unwrap();
        let users = UserRepository::new(db.pool());
        let a = users.create(1, 300).await.unwrap();
        let b = users.create(2, 300).await.unwrap();
        let repo = SeenRepository::new(db.pool());

        assert!(!repo.is_seen(a.id, "h1").await.unwrap());
        repo.mark_seen(a.id, "h1", Utc::now()).await.unwrap();
        assert!(repo.is_seen(a.id, "h1").await.unwrap());
        // Another user is unaffected
        assert!(!repo.is_seen(b.id, "h1").await.unwrap());
    }

    #[tokio::test]
    async fn test_mark_seen_idempotent() {
        let db = Database::open_in_memory().await.unwrap();
        let user = UserRepository::new(db.pool()).create(1, 300).await.unwrap();
        let repo = SeenRepository::new(db.pool());

        repo.mark_seen(user.id, "h1", Utc::now()).await.unwrap();
        repo.mark_seen(user.id, "h1", Utc::now()).await.unwrap();
        assert_eq!(repo.count_for_user(user.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_prune_before() {
        let db = Database::open_in_memory().await.unwrap();
        let user = UserRepository::new(db.pool()).create(1, 300).await.unwrap();
        let repo = SeenRepository::new(db.pool());

        let now = Utc.with_ymd_and_hms(2024, 6, 30, 0, 0, 0).unwrap();
        repo.mark_seen(user.id, "old", now - Duration::days(31))
            .await
            .unwrap();
        repo.mark_seen(user.id, "new", now - Duration::days(1))
            .await
            .unwrap();

        let pruned = repo.prune_before(now - Duration::days(30)).await.unwrap();
        assert_eq!(pruned, 1);
        assert!(!repo.is_seen(user.id, "old").await.unwrap());
        assert!(repo.is_seen(user.id, "new").await.unwrap());
    }
}
