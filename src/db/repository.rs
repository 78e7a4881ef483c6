//! User repository for newsbot.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use super::user::{User, UserRow};
use crate::datetime::to_sql_datetime;
use crate::{NewsbotError, Result};

const USER_COLUMNS: &str =
    "id, telegram_id, is_active, update_interval, last_update, created_at";

/// Repository for subscriber rows.
pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    /// Create a new UserRepository with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a user with the given polling interval.
    pub async fn create(&self, telegram_id: i64, update_interval: i64) -> Result<User> {
        let result = sqlx::query("INSERT INTO users (telegram_id, update_interval) VALUES (?, ?)")
            .bind(telegram_id)
            .bind(update_interval)
            .execute(self.pool)
            .await?;

        self.get_by_id(result.last_insert_rowid())
            .await?
            .ok_or_else(|| NewsbotError::NotFound("user".to_string()))
    }

    /// Get a user by row id.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    /// Get a user by Telegram id.
    pub async fn get_by_telegram_id(&self, telegram_id: i64) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE telegram_id = ?"
        ))
        .bind(telegram_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    /// Get a user, creating them if this is their first interaction.
    ///
    /// An inactive user is reactivated.
    pub async fn get_or_create(&self, telegram_id: i64, default_interval: i64) -> Result<User> {
        sqlx::query(
            "INSERT INTO users (telegram_id, update_interval) VALUES (?, ?)
             ON CONFLICT(telegram_id) DO UPDATE SET is_active = 1",
        )
        .bind(telegram_id)
        .bind(default_interval)
        .execute(self.pool)
        .await?;

        self.get_by_telegram_id(telegram_id)
            .await?
            .ok_or_else(|| NewsbotError::NotFound("user".to_string()))
    }

    /// List active users ordered by id.
    pub async fn list_active(&self) -> Result<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE is_active = 1 ORDER BY id"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    /// Set the active flag. Returns false if the user does not exist.
    pub async fn set_active(&self, id: i64, is_active: bool) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET is_active = ? WHERE id = ?")
            .bind(is_active)
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Update the personal polling interval.
    pub async fn update_interval(&self, id: i64, seconds: i64) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET update_interval = ? WHERE id = ?")
            .bind(seconds)
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Record that the pipeline processed this user at `at`.
    pub async fn touch_last_update(&self, id: i64, at: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE users SET last_update = ? WHERE id = ?")
            .bind(to_sql_datetime(&at))
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(())
    }
}
