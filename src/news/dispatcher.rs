//! Formatting and paced delivery of records to one user.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::types::NewsRecord;
use crate::config::BotConfig;
use crate::datetime::{format_utc_datetime, DISPLAY_FORMAT};
use crate::subscription::SourceKind;
use crate::telegram::{DeliveryError, MessageSender, OutgoingMessage};

/// Escape text for Telegram's HTML parse mode.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

fn source_emoji(kind: SourceKind) -> &'static str {
    match kind {
        SourceKind::Rss => "\u{1f4f0}",
        SourceKind::ExchangeAnnouncements => "\u{1f4e2}",
    }
}

/// Render a record as an HTML message.
pub fn format_message(record: &NewsRecord, timezone: &str) -> String {
    let mut text = format!(
        "{} <b>{}</b>\n",
        source_emoji(record.kind),
        escape_html(&record.title)
    );
    if !record.description.is_empty() {
        text.push('\n');
        text.push_str(&escape_html(&record.description));
        text.push('\n');
    }
    text.push_str(&format!(
        "\n\u{1f552} {} \u{b7} {}\n<a href=\"{}\">Read more</a>",
        format_utc_datetime(&record.published, timezone, DISPLAY_FORMAT),
        escape_html(&record.source_name),
        escape_html(&record.link)
    ));
    text
}

/// Outcome of delivering to one user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Hashes of records delivered successfully.
    pub delivered: Vec<String>,
    /// Messages that failed for reasons other than a block.
    pub failed: usize,
    /// The user has blocked the bot; delivery stopped.
    pub blocked: bool,
}

/// Sends records to a user with pacing and a per-cycle cap.
pub struct Dispatcher {
    sender: Arc<dyn MessageSender>,
    timezone: String,
    message_delay: Duration,
    max_per_user: usize,
}

impl Dispatcher {
    /// Create a dispatcher from the bot configuration.
    pub fn new(sender: Arc<dyn MessageSender>, config: &BotConfig) -> Self {
        Self {
            sender,
            timezone: config.timezone.clone(),
            message_delay: Duration::from_millis(config.message_delay_ms),
            max_per_user: config.max_messages_per_cycle,
        }
    }

    /// Deliver up to the cap of `records` to `chat_id`, in order.
    ///
    /// Failed messages are logged and skipped. A block stops delivery.
    pub async fn deliver(&self, chat_id: i64, records: &[&NewsRecord]) -> DeliveryReport {
        let mut report = DeliveryReport::default();

        for (i, record) in records.iter().take(self.max_per_user).enumerate() {
            if i > 0 && !self.message_delay.is_zero() {
                tokio::time::sleep(self.message_delay).await;
            }

            let message = OutgoingMessage::new(chat_id, format_message(record, &self.timezone))
                .html()
                .without_preview();

            match self.sender.send_message(&message).await {
                Ok(()) => {
                    debug!(chat_id, hash = %record.hash, "News delivered");
                    report.delivered.push(record.hash.clone());
                }
                Err(DeliveryError::Blocked) => {
                    warn!(chat_id, "User blocked the bot, stopping delivery");
                    report.blocked = true;
                    break;
                }
                Err(e) => {
                    warn!(chat_id, hash = %record.hash, "Failed to deliver news: {}", e);
                    report.failed += 1;
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Records messages; can fail one call or act as blocked.
    #[derive(Default)]
    struct FakeSender {
        sent: Mutex<Vec<OutgoingMessage>>,
        calls: AtomicUsize,
        fail_on_call: Option<usize>,
        blocked: bool,
    }

    #[async_trait]
    impl MessageSender for FakeSender {
        async fn send_message(&self, message: &OutgoingMessage) -> Result<(), DeliveryError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.blocked {
                return Err(DeliveryError::Blocked);
            }
            if self.fail_on_call == Some(call) {
                return Err(DeliveryError::Transport("boom".to_string()));
            }
            self.sent.lock().unwrap().push(message.clone());
            Ok(())
        }
    }

    fn record(n: usize) -> NewsRecord {
        NewsRecord {
            title: format!("ETH <news> #{n}"),
            link: format!("https://example.com/{n}?a=1&b=2"),
            description: "Fees & \"gas\"".to_string(),
            published: Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap(),
            hash: format!("hash-{n}"),
            kind: SourceKind::Rss,
            source_name: "Example".to_string(),
        }
    }

    fn config(max: usize) -> BotConfig {
        BotConfig {
            max_messages_per_cycle: max,
            message_delay_ms: 0,
            timezone: "Europe/Moscow".to_string(),
            ..BotConfig::default()
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a < b & c > \"d\""), "a &lt; b &amp; c &gt; &quot;d&quot;");
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_format_message() {
        let text = format_message(&record(1), "Europe/Moscow");
        assert!(text.starts_with("\u{1f4f0} <b>ETH &lt;news&gt; #1</b>\n"));
        assert!(text.contains("Fees &amp; &quot;gas&quot;"));
        assert!(text.contains("15.01.2024 13:30"));
        assert!(text.contains("<a href=\"https://example.com/1?a=1&amp;b=2\">Read more</a>"));
    }

    #[test]
    fn test_format_message_announcement_without_description() {
        let mut r = record(1);
        r.kind = SourceKind::ExchangeAnnouncements;
        r.description.clear();
        let text = format_message(&r, "UTC");
        assert!(text.starts_with("\u{1f4e2} "));
        assert!(!text.contains("\n\n\n"));
        assert!(text.contains("15.01.2024 10:30"));
    }

    #[tokio::test]
    async fn test_deliver_respects_cap() {
        let sender = Arc::new(FakeSender::default());
        let dispatcher = Dispatcher::new(sender.clone(), &config(2));
        let records: Vec<NewsRecord> = (0..5).map(record).collect();
        let refs: Vec<&NewsRecord> = records.iter().collect();

        let report = dispatcher.deliver(42, &refs).await;
        assert_eq!(report.delivered, vec!["hash-0", "hash-1"]);
        assert_eq!(report.failed, 0);
        assert!(!report.blocked);

        let sent = sender.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].chat_id, 42);
        assert!(sent[0].disable_preview);
        assert!(sent[0].parse_mode.is_some());
    }

    #[tokio::test]
    async fn test_deliver_skips_failures() {
        let sender = Arc::new(FakeSender {
            fail_on_call: Some(1),
            ..FakeSender::default()
        });
        let dispatcher = Dispatcher::new(sender.clone(), &config(10));
        let records: Vec<NewsRecord> = (0..3).map(record).collect();
        let refs: Vec<&NewsRecord> = records.iter().collect();

        let report = dispatcher.deliver(42, &refs).await;
        assert_eq!(report.delivered, vec!["hash-0", "hash-2"]);
        assert_eq!(report.failed, 1);
    }

    #[tokio::test]
    async fn test_deliver_stops_when_blocked() {
        let sender = Arc::new(FakeSender {
            blocked: true,
            ..FakeSender::default()
        });
        let dispatcher = Dispatcher::new(sender, &config(10));
        let records: Vec<NewsRecord> = (0..3).map(record).collect();
        let refs: Vec<&NewsRecord> = records.iter().collect();

        let report = dispatcher.deliver(42, &refs).await;
        assert!(report.blocked);
        assert!(report.delivered.is_empty());
        assert_eq!(report.failed, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deliver_paces_messages() {
        let sender = Arc::new(FakeSender::default());
        let mut cfg = config(10);
        cfg.message_delay_ms = 500;
        let dispatcher = Dispatcher::new(sender, &cfg);
        let records: Vec<NewsRecord> = (0..3).map(record).collect();
        let refs: Vec<&NewsRecord> = records.iter().collect();

        let start = tokio::time::Instant::now();
        dispatcher.deliver(42, &refs).await;
        assert!(start.elapsed() >= Duration::from_millis(1000));
        assert!(start.elapsed() < Duration::from_millis(1500));
    }
}
