//! Long-polling update loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::handler::BotHandler;
use crate::telegram::TelegramClient;

/// Delay before polling again after a failed getUpdates call.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Receives updates and hands their messages to the [`BotHandler`].
pub struct UpdateRunner {
    client: Arc<TelegramClient>,
    handler: Arc<BotHandler>,
    retry_delay: Duration,
}

impl UpdateRunner {
    /// Create a new runner.
    pub fn new(client: Arc<TelegramClient>, handler: Arc<BotHandler>) -> Self {
        Self {
            client,
            handler,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    /// Set the delay after a failed poll.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Poll until `shutdown` turns true or its sender is dropped.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!("Update loop started");
        let mut offset: Option<i64> = None;

        loop {
            if *shutdown.borrow() {
                break;
            }

            let result = tokio::select! {
                _ = shutdown.changed() => break,
                result = self.client.get_updates(offset) => result,
            };

            match result {
                Ok(updates) => {
                    if !updates.is_empty() {
                        debug!(count = updates.len(), "Received updates");
                    }
                    for update in updates {
                        // Acknowledge before handling so a failing message is not redelivered
                        offset = Some(update.update_id + 1);
                        let Some(message) = update.into_incoming() else {
                            continue;
                        };
                        if let Err(e) = self.handler.handle(&message).await {
                            warn!(chat_id = message.chat_id, "Failed to handle message: {}", e);
                        }
                    }
                }
                Err(e) => {
                    warn!(
                        "Polling failed, retrying in {} seconds: {}",
                        self.retry_delay.as_secs(),
                        e
                    );
                    tokio::select! {
                        _ = shutdown.changed() => break,
                        _ = tokio::time::sleep(self.retry_delay) => {}
                    }
                }
            }
        }

        info!("Update loop stopped");
    }
}
