//! Subscription service for newsbot.
//!
//! Keyword, source and interval management on behalf of a chat user.
//! Users are addressed by their Telegram id and registered on first use.

use std::collections::HashSet;

use tracing::{debug, info};

use super::repository::{KeywordRepository, SourceRepository};
use super::types::{AddKeywordsOutcome, NewSource, Source, SourceKind};
use super::validation::{
    parse_keyword_list, parse_source_input, validate_interval, validate_keyword, ValidationError,
};
use crate::config::Config;
use crate::db::{Database, User, UserRepository};
use crate::{NewsbotError, Result};

/// Display name used for the announcement source.
pub const ANNOUNCEMENT_SOURCE_NAME: &str = "Exchange announcements";

/// Service for subscription operations.
pub struct SubscriptionService<'a> {
    db: &'a Database,
    config: &'a Config,
}

impl<'a> SubscriptionService<'a> {
    /// Create a new SubscriptionService.
    pub fn new(db: &'a Database, config: &'a Config) -> Self {
        Self { db, config }
    }

    /// Get or create the user, reactivating them if they had blocked the bot.
    pub async fn register_user(&self, telegram_id: i64) -> Result<User> {
        let user = UserRepository::new(self.db.pool())
            .get_or_create(telegram_id, crate::config::DEFAULT_USER_INTERVAL_SECS)
            .await?;
        debug!(telegram_id, user_id = user.id, "User registered");
        Ok(user)
    }

    /// Add comma-separated keywords.
    ///
    /// Invalid items and duplicates are reported in the outcome. If the new
    /// keywords would push the user over the cap, nothing is stored.
    pub async fn add_keywords(&self, telegram_id: i64, raw: &str) -> Result<AddKeywordsOutcome> {
        let user = self.register_user(telegram_id).await?;
        let repo = KeywordRepository::new(self.db.pool());

        let items = parse_keyword_list(raw);
        if items.is_empty() {
            return Err(ValidationError::NoKeywords.into());
        }

        let existing: HashSet<String> = repo.list(user.id).await?.into_iter().collect();
        let mut outcome = AddKeywordsOutcome::default();
        let mut fresh: Vec<String> = Vec::new();

        for item in items {
            match validate_keyword(&item) {
                Ok(word) => {
                    if existing.contains(&word) || fresh.contains(&word) {
                        outcome.skipped.push(word);
                    } else {
                        fresh.push(word);
                    }
                }
                Err(e) => outcome.invalid.push((item, e.to_string())),
            }
        }

        let max = self.config.bot.max_keywords;
        if existing.len() + fresh.len() > max {
            return Err(ValidationError::KeywordLimitExceeded { max }.into());
        }

        for word in fresh {
            if repo.add(user.id, &word).await? {
                outcome.added.push(word);
            } else {
                outcome.skipped.push(word);
            }
        }

        info!(
            telegram_id,
            added = outcome.added.len(),
            skipped = outcome.skipped.len(),
            invalid = outcome.invalid.len(),
            "Keywords added"
        );
        Ok(outcome)
    }

    /// Remove a keyword, case-insensitively. Returns false if it was not present.
    pub async fn remove_keyword(&self, telegram_id: i64, word: &str) -> Result<bool> {
        let user = self.register_user(telegram_id).await?;
        let word = word.trim().to_lowercase();
        let removed = KeywordRepository::new(self.db.pool())
            .remove(user.id, &word)
            .await?;
        if removed {
            info!(telegram_id, keyword = %word, "Keyword removed");
        }
        Ok(removed)
    }

    /// List the user's keywords.
    pub async fn list_keywords(&self, telegram_id: i64) -> Result<Vec<String>> {
        let user = self.register_user(telegram_id).await?;
        KeywordRepository::new(self.db.pool()).list(user.id).await
    }

    /// Remove all of the user's keywords. Returns the number removed.
    pub async fn clear_keywords(&self, telegram_id: i64) -> Result<u64> {
        let user = self.register_user(telegram_id).await?;
        let removed = KeywordRepository::new(self.db.pool())
            .clear(user.id)
            .await?;
        info!(telegram_id, removed, "Keywords cleared");
        Ok(removed)
    }

    /// List active sources.
    pub async fn list_sources(&self) -> Result<Vec<Source>> {
        SourceRepository::new(self.db.pool()).list_active().await
    }

    /// Add an RSS source from `name | url` input.
    pub async fn add_rss_source(&self, raw: &str) -> Result<Source> {
        let (name, url) = parse_source_input(raw)?;
        self.add_source(NewSource::new(name, url)).await
    }

    /// Add the configured exchange announcement endpoint.
    pub async fn add_announcement_source(&self) -> Result<Source> {
        self.add_source(
            NewSource::new(ANNOUNCEMENT_SOURCE_NAME, &self.config.feeds.announcement_url)
                .with_kind(SourceKind::ExchangeAnnouncements),
        )
        .await
    }

    async fn add_source(&self, source: NewSource) -> Result<Source> {
        let repo = SourceRepository::new(self.db.pool());
        if let Some(existing) = repo.get_by_url(&source.url).await? {
            if existing.is_active {
                return Err(ValidationError::SourceExists.into());
            }
        }
        let source = repo.upsert_active(&source).await?;
        info!(source_id = source.id, url = %source.url, kind = %source.kind, "Source added");
        Ok(source)
    }

    /// Soft-delete a source.
    pub async fn remove_source(&self, id: i64) -> Result<Source> {
        let repo = SourceRepository::new(self.db.pool());
        let source = repo
            .get_by_id(id)
            .await?
            .filter(|s| s.is_active)
            .ok_or_else(|| NewsbotError::NotFound(format!("source #{id}")))?;
        repo.deactivate(id).await?;
        info!(source_id = id, url = %source.url, "Source removed");
        Ok(source)
    }

    /// Set the user's polling interval from text input. Returns the seconds stored.
    pub async fn set_interval(&self, telegram_id: i64, raw: &str) -> Result<i64> {
        let seconds = validate_interval(raw)?;
        let user = self.register_user(telegram_id).await?;
        UserRepository::new(self.db.pool())
            .update_interval(user.id, seconds)
            .await?;
        info!(telegram_id, seconds, "Update interval changed");
        Ok(seconds)
    }

    /// Insert the configured default sources into an empty source table.
    pub async fn seed_default_sources(&self) -> Result<usize> {
        let seeds: Vec<NewSource> = self
            .config
            .sources
            .iter()
            .map(|s| NewSource::new(&s.name, &s.url).with_kind(s.kind))
            .collect();
        let inserted = SourceRepository::new(self.db.pool()).seed(&seeds).await?;
        if inserted > 0 {
            info!("Seeded {} default sources", inserted);
        }
        Ok(inserted)
    }
}
