//! Subscriber model for newsbot.

use chrono::{DateTime, Duration, Utc};

use crate::datetime::parse_datetime;

/// A subscriber, identified by their Telegram chat id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Row id.
    pub id: i64,
    /// Telegram user/chat id.
    pub telegram_id: i64,
    /// Inactive users are skipped by the pipeline.
    pub is_active: bool,
    /// Personal polling interval in seconds.
    pub update_interval: i64,
    /// Last time the pipeline processed this user.
    pub last_update: Option<DateTime<Utc>>,
    /// Registration time.
    pub created_at: DateTime<Utc>,
}

/// Slack for the whole-second precision of `last_update` and tick jitter.
pub const DUE_TOLERANCE_SECS: i64 = 1;

impl User {
    /// Whether the user's own interval has elapsed at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.last_update {
            None => true,
            Some(last) => {
                now - last >= Duration::seconds(self.update_interval - DUE_TOLERANCE_SECS)
            }
        }
    }
}

/// Row type for a user from the database.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct UserRow {
    id: i64,
    telegram_id: i64,
    is_active: bool,
    update_interval: i64,
    last_update: Option<String>,
    created_at: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            telegram_id: row.telegram_id,
            is_active: row.is_active,
            update_interval: row.update_interval,
            last_update: row.last_update.as_deref().and_then(parse_datetime),
            created_at: parse_datetime(&row.created_at).unwrap_or_else(Utc::now),
        }
    }
}
