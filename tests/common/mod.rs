//! Test helpers for integration tests.
//!
//! Provides a recording message sender, database and config setup, and
//! builders for feed bodies served by wiremock.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use newsbot::subscription::{NewSource, SourceRepository};
use newsbot::{
    Config, Database, DeliveryError, MessageSender, OutgoingMessage, Source, SourceKind,
    SubscriptionService,
};

/// Default timeout for waiting on background tasks.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Message sender that records everything it is asked to send.
#[derive(Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<OutgoingMessage>>,
    blocked: Mutex<HashSet<i64>>,
}

impl RecordingSender {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make deliveries to `chat_id` fail as if the user blocked the bot.
    pub fn block(&self, chat_id: i64) {
        self.blocked.lock().unwrap().insert(chat_id);
    }

    pub fn sent(&self) -> Vec<OutgoingMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, chat_id: i64) -> Vec<OutgoingMessage> {
        self.sent()
            .into_iter()
            .filter(|m| m.chat_id == chat_id)
            .collect()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

#[async_trait]
impl MessageSender for RecordingSender {
    async fn send_message(&self, message: &OutgoingMessage) -> Result<(), DeliveryError> {
        if self.blocked.lock().unwrap().contains(&message.chat_id) {
            return Err(DeliveryError::Blocked);
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

/// Config suitable for tests: local hosts allowed, no pacing, no seeds.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.telegram.token = "TEST".to_string();
    config.feeds.allow_private_hosts = true;
    config.scheduler.first_delay_secs = 0;
    config.bot.message_delay_ms = 0;
    config.bot.timezone = "UTC".to_string();
    config.sources.clear();
    config
}

/// Fresh in-memory database.
pub async fn test_db() -> Arc<Database> {
    Arc::new(
        Database::open_in_memory()
            .await
            .expect("Failed to create test database"),
    )
}

/// Register an active source.
pub async fn add_source(db: &Database, name: &str, url: &str, kind: SourceKind) -> Source {
    SourceRepository::new(db.pool())
        .upsert_active(&NewSource::new(name, url).with_kind(kind))
        .await
        .expect("Failed to add source")
}

/// Register a user and give them keywords.
pub async fn subscribe(db: &Database, config: &Config, telegram_id: i64, keywords: &str) {
    let service = SubscriptionService::new(db, config);
    service
        .register_user(telegram_id)
        .await
        .expect("Failed to register user");
    if !keywords.is_empty() {
        service
            .add_keywords(telegram_id, keywords)
            .await
            .expect("Failed to add keywords");
    }
}

/// One RSS item.
pub struct FeedItem<'a> {
    pub title: &'a str,
    pub link: &'a str,
    pub description: &'a str,
    pub published: DateTime<Utc>,
}

/// Build an RSS 2.0 document.
pub fn rss_feed(items: &[FeedItem<'_>]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
<channel>
<title>Test Feed</title>
<link>https://news.example.com</link>
<description>Test</description>
"#,
    );
    for item in items {
        xml.push_str(&format!(
            "<item><title>{}</title><link>{}</link><description>{}</description><pubDate>{}</pubDate></item>\n",
            item.title,
            item.link,
            item.description,
            item.published.to_rfc2822()
        ));
    }
    xml.push_str("</channel>\n</rss>\n");
    xml
}
