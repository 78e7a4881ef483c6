//! Configuration module for newsbot.

use serde::Deserialize;
use std::path::Path;

use crate::subscription::SourceKind;
use crate::{NewsbotError, Result};

/// Lower bound for a user's polling interval in seconds.
pub const MIN_USER_INTERVAL_SECS: i64 = 60;

/// Upper bound for a user's polling interval in seconds.
pub const MAX_USER_INTERVAL_SECS: i64 = 3600;

/// Polling interval given to new users in seconds.
pub const DEFAULT_USER_INTERVAL_SECS: i64 = 300;

/// Environment variable that overrides `telegram.token`.
pub const TOKEN_ENV_VAR: &str = "NEWSBOT_TELEGRAM_TOKEN";

/// Telegram Bot API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    /// Bot token issued by BotFather.
    #[serde(default)]
    pub token: String,
    /// Base URL of the Bot API.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Long-polling timeout for getUpdates in seconds.
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,
}

fn default_api_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_poll_timeout() -> u64 {
    30
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            api_url: default_api_url(),
            poll_timeout_secs: default_poll_timeout(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/newsbot.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/newsbot.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Poll cycle scheduling.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Interval between poll cycles in seconds.
    #[serde(default = "default_scheduler_interval")]
    pub interval_secs: u64,
    /// Delay before the first cycle in seconds.
    #[serde(default = "default_first_delay")]
    pub first_delay_secs: u64,
    /// Maximum number of sources fetched at the same time.
    #[serde(default = "default_fetch_concurrency")]
    pub fetch_concurrency: usize,
}

fn default_scheduler_interval() -> u64 {
    300 // 5 minutes
}

fn default_first_delay() -> u64 {
    10
}

fn default_fetch_concurrency() -> usize {
    4
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_scheduler_interval(),
            first_delay_secs: default_first_delay(),
            fetch_concurrency: default_fetch_concurrency(),
        }
    }
}

/// Source fetching limits.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedsConfig {
    /// Maximum entries taken from one source per cycle.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
    /// Maximum response size in bytes.
    #[serde(default = "default_max_feed_size")]
    pub max_feed_size_bytes: u64,
    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Total request timeout in seconds.
    #[serde(default = "default_total_timeout")]
    pub total_timeout_secs: u64,
    /// Maximum number of redirects.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    /// User agent sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Allow loopback and private hosts (local testing only).
    #[serde(default)]
    pub allow_private_hosts: bool,
    /// Endpoint used when a user adds the announcement source.
    #[serde(default = "default_announcement_url")]
    pub announcement_url: String,
    /// Prefix joined with the announcement code to build a link.
    #[serde(default = "default_announcement_link_base")]
    pub announcement_link_base: String,
}

fn default_max_entries() -> usize {
    50
}

fn default_max_feed_size() -> u64 {
    5 * 1024 * 1024 // 5MB
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_total_timeout() -> u64 {
    30
}

fn default_max_redirects() -> usize {
    5
}

fn default_user_agent() -> String {
    concat!("newsbot/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_announcement_url() -> String {
    "https://www.binance.com/bapi/composite/v1/public/cms/announcement/query".to_string()
}

fn default_announcement_link_base() -> String {
    "https://www.binance.com/en/support/announcement".to_string()
}

impl Default for FeedsConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            max_feed_size_bytes: default_max_feed_size(),
            connect_timeout_secs: default_connect_timeout(),
            total_timeout_secs: default_total_timeout(),
            max_redirects: default_max_redirects(),
            user_agent: default_user_agent(),
            allow_private_hosts: false,
            announcement_url: default_announcement_url(),
            announcement_link_base: default_announcement_link_base(),
        }
    }
}

/// Per-user behaviour of the bot.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Maximum keywords a user may hold.
    #[serde(default = "default_max_keywords")]
    pub max_keywords: usize,
    /// Maximum messages sent to one user in one cycle.
    #[serde(default = "default_max_messages")]
    pub max_messages_per_cycle: usize,
    /// Delay between two messages to the same user in milliseconds.
    #[serde(default = "default_message_delay")]
    pub message_delay_ms: u64,
    /// Timezone for displayed timestamps (e.g. "Europe/Moscow", "UTC").
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Days a delivered fingerprint is remembered.
    #[serde(default = "default_seen_retention")]
    pub seen_retention_days: i64,
}

fn default_max_keywords() -> usize {
    10
}

fn default_max_messages() -> usize {
    10
}

fn default_message_delay() -> u64 {
    500
}

fn default_timezone() -> String {
    "Europe/Moscow".to_string()
}

fn default_seen_retention() -> i64 {
    30
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            max_keywords: default_max_keywords(),
            max_messages_per_cycle: default_max_messages(),
            message_delay_ms: default_message_delay(),
            timezone: default_timezone(),
            seen_retention_days: default_seen_retention(),
        }
    }
}

/// A source inserted when the sources table is empty.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SourceSeed {
    /// Display name.
    pub name: String,
    /// Feed or endpoint URL.
    pub url: String,
    /// Source type.
    #[serde(default)]
    pub kind: SourceKind,
}

fn default_sources() -> Vec<SourceSeed> {
    vec![
        SourceSeed {
            name: "CoinTelegraph".to_string(),
            url: "https://cointelegraph.com/rss".to_string(),
            kind: SourceKind::Rss,
        },
        SourceSeed {
            name: "Bitcoin.com News".to_string(),
            url: "https://news.bitcoin.com/feed/".to_string(),
            kind: SourceKind::Rss,
        },
    ]
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Telegram configuration.
    #[serde(default)]
    pub telegram: TelegramConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Scheduler configuration.
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Fetch configuration.
    #[serde(default)]
    pub feeds: FeedsConfig,
    /// Bot behaviour.
    #[serde(default)]
    pub bot: BotConfig,
    /// Sources seeded into an empty database.
    #[serde(default = "default_sources")]
    pub sources: Vec<SourceSeed>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            telegram: TelegramConfig::default(),
            database: DatabaseConfig::default(),
            logging: LoggingConfig::default(),
            scheduler: SchedulerConfig::default(),
            feeds: FeedsConfig::default(),
            bot: BotConfig::default(),
            sources: default_sources(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(NewsbotError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| NewsbotError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `NEWSBOT_TELEGRAM_TOKEN`: Override the bot token
    pub fn apply_env_overrides(&mut self) {
        if let Ok(token) = std::env::var(TOKEN_ENV_VAR) {
            if !token.is_empty() {
                self.telegram.token = token;
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.telegram.token.trim().is_empty() {
            return Err(NewsbotError::Config(format!(
                "telegram.token is empty (set it in the config file or {TOKEN_ENV_VAR})"
            )));
        }
        if self.scheduler.interval_secs == 0 {
            return Err(NewsbotError::Config(
                "scheduler.interval_secs must be greater than 0".to_string(),
            ));
        }
        if self.scheduler.fetch_concurrency == 0 {
            return Err(NewsbotError::Config(
                "scheduler.fetch_concurrency must be greater than 0".to_string(),
            ));
        }
        if self.bot.max_keywords == 0 {
            return Err(NewsbotError::Config(
                "bot.max_keywords must be greater than 0".to_string(),
            ));
        }
        if self.bot.timezone.parse::<chrono_tz::Tz>().is_err() {
            return Err(NewsbotError::Config(format!(
                "unknown timezone: {}",
                self.bot.timezone
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.telegram.api_url, "https://api.telegram.org");
        assert_eq!(config.telegram.poll_timeout_secs, 30);
        assert_eq!(config.database.path, "data/newsbot.db");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.scheduler.interval_secs, 300);
        assert_eq!(config.scheduler.first_delay_secs, 10);
        assert_eq!(config.feeds.max_entries, 50);
        assert_eq!(config.feeds.total_timeout_secs, 30);
        assert!(!config.feeds.allow_private_hosts);
        assert_eq!(config.bot.max_keywords, 10);
        assert_eq!(config.bot.message_delay_ms, 500);
        assert_eq!(config.bot.seen_retention_days, 30);
        assert_eq!(config.sources.len(), 2);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[telegram]
token = "123:abc"
api_url = "http://localhost:8081"
poll_timeout_secs = 5

[database]
path = "/tmp/bot.db"

[logging]
level = "debug"
file = "/tmp/bot.log"

[scheduler]
interval_secs = 120
first_delay_secs = 0
fetch_concurrency = 2

[feeds]
max_entries = 20
allow_private_hosts = true

[bot]
max_keywords = 5
max_messages_per_cycle = 3
message_delay_ms = 0
timezone = "UTC"
seen_retention_days = 7

[[sources]]
name = "Exchange"
url = "https://example.com/announcements"
kind = "exchange_announcements"
"#;
        let config = Config::parse(toml).unwrap();
        assert_eq!(config.telegram.token, "123:abc");
        assert_eq!(config.telegram.api_url, "http://localhost:8081");
        assert_eq!(config.database.path, "/tmp/bot.db");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.scheduler.interval_secs, 120);
        assert_eq!(config.scheduler.fetch_concurrency, 2);
        assert_eq!(config.feeds.max_entries, 20);
        assert!(config.feeds.allow_private_hosts);
        assert_eq!(config.bot.max_keywords, 5);
        assert_eq!(config.bot.timezone, "UTC");
        assert_eq!(config.sources.len(), 1);
        assert_eq!(config.sources[0].kind, SourceKind::ExchangeAnnouncements);
    }

    #[test]
    fn test_parse_partial_config() {
        let toml = r#"
[bot]
max_keywords = 3
"#;
        let config = Config::parse(toml).unwrap();
        assert_eq!(config.bot.max_keywords, 3);
        assert_eq!(config.bot.max_messages_per_cycle, 10);
        assert_eq!(config.scheduler.interval_secs, 300);
        assert_eq!(config.sources.len(), 2);
    }

    #[test]
    fn test_source_kind_defaults_to_rss() {
        let toml = r#"
[[sources]]
name = "Feed"
url = "https://example.com/rss"
"#;
        let config = Config::parse(toml).unwrap();
        assert_eq!(config.sources[0].kind, SourceKind::Rss);
    }

    #[test]
    fn test_parse_invalid_config() {
        let result = Config::parse("[scheduler]\ninterval_secs = \"soon\"");
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("config parse error"));
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = Config::load("/nonexistent/newsbot.toml");
        assert!(matches!(result, Err(NewsbotError::Io(_))));
    }

    #[test]
    fn test_validate_requires_token() {
        let config = Config::default();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("telegram.token"));
    }

    #[test]
    fn test_validate_ok() {
        let mut config = Config::default();
        config.telegram.token = "123:abc".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_unknown_timezone() {
        let mut config = Config::default();
        config.telegram.token = "123:abc".to_string();
        config.bot.timezone = "Mars/Olympus".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let mut config = Config::default();
        config.telegram.token = "123:abc".to_string();
        config.scheduler.interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_example_config_matches_defaults() {
        let config = Config::parse(include_str!("../config.example.toml")).unwrap();
        let defaults = Config::default();
        assert_eq!(config.scheduler.interval_secs, defaults.scheduler.interval_secs);
        assert_eq!(config.feeds.announcement_url, defaults.feeds.announcement_url);
        assert_eq!(config.bot.timezone, defaults.bot.timezone);
        assert_eq!(config.sources, defaults.sources);
    }
}
