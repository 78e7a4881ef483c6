//! One poll cycle: fetch, normalize, match, deliver.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use super::dispatcher::Dispatcher;
use super::fetcher::NewsFetcher;
use super::matcher::match_keywords;
use super::normalize::normalize;
use super::seen::SeenRepository;
use super::types::{NewsRecord, RawEntry};
use crate::config::Config;
use crate::db::{Database, User, UserRepository};
use crate::subscription::{KeywordRepository, Source, SourceRepository};
use crate::telegram::MessageSender;
use crate::Result;

/// Counters for one cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Sources fetched successfully.
    pub sources_fetched: usize,
    /// Sources that failed to fetch or parse.
    pub sources_failed: usize,
    /// Distinct records after normalization.
    pub records: usize,
    /// Due users processed.
    pub users_processed: usize,
    /// Messages delivered.
    pub messages_sent: usize,
    /// Messages that failed.
    pub messages_failed: usize,
    /// Users deactivated because they blocked the bot.
    pub users_deactivated: usize,
    /// Seen records pruned.
    pub seen_pruned: u64,
}

/// The fetch-match-deliver pipeline.
pub struct Pipeline {
    db: Arc<Database>,
    fetcher: NewsFetcher,
    dispatcher: Dispatcher,
    fetch_concurrency: usize,
    seen_retention: Duration,
}

impl Pipeline {
    /// Create a pipeline from the configuration.
    pub fn new(db: Arc<Database>, sender: Arc<dyn MessageSender>, config: &Config) -> Result<Self> {
        Ok(Self {
            db,
            fetcher: NewsFetcher::new(&config.feeds)?,
            dispatcher: Dispatcher::new(sender, &config.bot),
            fetch_concurrency: config.scheduler.fetch_concurrency.max(1),
            seen_retention: Duration::days(config.bot.seen_retention_days),
        })
    }

    /// Run one cycle now.
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        self.run_cycle_at(Utc::now()).await
    }

    /// Run one cycle as if the current time were `now`.
    pub async fn run_cycle_at(&self, now: DateTime<Utc>) -> Result<CycleReport> {
        let mut report = CycleReport::default();

        let sources = SourceRepository::new(self.db.pool()).list_active().await?;
        let raw = self.fetch_all(sources, now, &mut report).await?;
        let records = build_records(raw, now);
        report.records = records.len();

        let users = UserRepository::new(self.db.pool()).list_active().await?;
        for user in users.iter().filter(|u| u.is_due(now)) {
            if let Err(e) = self.process_user(user, &records, now, &mut report).await {
                warn!(user_id = user.id, "Failed to process user: {}", e);
            }
        }

        let cutoff = now - self.seen_retention;
        report.seen_pruned = SeenRepository::new(self.db.pool())
            .prune_before(cutoff)
            .await?;

        info!(
            sources_fetched = report.sources_fetched,
            sources_failed = report.sources_failed,
            records = report.records,
            users = report.users_processed,
            sent = report.messages_sent,
            failed = report.messages_failed,
            deactivated = report.users_deactivated,
            pruned = report.seen_pruned,
            "Cycle complete"
        );
        Ok(report)
    }

    /// Fetch all sources with bounded concurrency.
    async fn fetch_all(
        &self,
        sources: Vec<Source>,
        now: DateTime<Utc>,
        report: &mut CycleReport,
    ) -> Result<Vec<RawEntry>> {
        let fetcher = &self.fetcher;
        let results: Vec<(Source, Result<Vec<RawEntry>>)> = stream::iter(sources)
            .map(|source| async move {
                let result = fetcher.fetch(&source).await;
                (source, result)
            })
            .buffer_unordered(self.fetch_concurrency)
            .collect()
            .await;

        let repo = SourceRepository::new(self.db.pool());
        let mut entries = Vec::new();
        for (source, result) in results {
            match result {
                Ok(mut fetched) => {
                    repo.update_last_fetch(source.id, now).await?;
                    report.sources_fetched += 1;
                    entries.append(&mut fetched);
                }
                Err(e) => {
                    warn!(source = %source.name, url = %source.url, "Failed to fetch source: {}", e);
                    report.sources_failed += 1;
                }
            }
        }
        Ok(entries)
    }

    async fn process_user(
        &self,
        user: &User,
        records: &[NewsRecord],
        now: DateTime<Utc>,
        report: &mut CycleReport,
    ) -> Result<()> {
        let keywords = KeywordRepository::new(self.db.pool()).list(user.id).await?;
        let seen = SeenRepository::new(self.db.pool());

        let mut pending = Vec::new();
        for record in match_keywords(records, &keywords) {
            if !seen.is_seen(user.id, &record.hash).await? {
                pending.push(record);
            }
        }
        debug!(
            user_id = user.id,
            keywords = keywords.len(),
            pending = pending.len(),
            "Matched records"
        );

        if !pending.is_empty() {
            let delivery = self.dispatcher.deliver(user.telegram_id, &pending).await;
            for hash in &delivery.delivered {
                seen.mark_seen(user.id, hash, now).await?;
            }
            report.messages_sent += delivery.delivered.len();
            report.messages_failed += delivery.failed;

            if delivery.blocked {
                UserRepository::new(self.db.pool())
                    .set_active(user.id, false)
                    .await?;
                report.users_deactivated += 1;
                info!(user_id = user.id, "User deactivated after blocking the bot");
            }
        }

        UserRepository::new(self.db.pool())
            .touch_last_update(user.id, now)
            .await?;
        report.users_processed += 1;
        Ok(())
    }
}

/// Normalize entries, drop duplicate fingerprints and sort newest first.
pub fn build_records(entries: Vec<RawEntry>, now: DateTime<Utc>) -> Vec<NewsRecord> {
    let mut seen = HashSet::new();
    let mut records: Vec<NewsRecord> = entries
        .into_iter()
        .map(|entry| normalize(entry, now))
        .filter(|record| seen.insert(record.hash.clone()))
        .collect();
    records.sort_by(|a, b| b.published.cmp(&a.published));
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscription::SourceKind;
    use chrono::TimeZone;

    fn entry(title: &str, link: &str, published: Option<DateTime<Utc>>) -> RawEntry {
        RawEntry {
            title: title.to_string(),
            link: link.to_string(),
            identity: link.to_string(),
            description: None,
            published,
            kind: SourceKind::Rss,
            source_name: "Example".to_string(),
        }
    }

    #[test]
    fn test_build_records_dedups_and_sorts() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let older = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
        let newer = Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap();

        let records = build_records(
            vec![
                entry("A", "https://e.com/a", Some(older)),
                entry("B", "https://e.com/b", Some(newer)),
                entry("A", "https://e.com/a", Some(older)),
                entry("C", "https://e.com/c", None),
            ],
            now,
        );

        let titles: Vec<&str> = records.iter().map(|r| r.title.as_str()).collect();
        // Undated entries get "now" and sort first
        assert_eq!(titles, vec!["C", "B", "A"]);
    }
}
