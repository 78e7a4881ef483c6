//! Bot API client over HTTPS.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::types::{ApiResponse, SendMessageRequest, Update};
use super::{DeliveryError, MessageSender, OutgoingMessage};
use crate::config::TelegramConfig;
use crate::{NewsbotError, Result};

/// Connect timeout in seconds.
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Timeout for calls other than long polling.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Extra time allowed on top of the long-poll timeout.
const POLL_GRACE_SECS: u64 = 10;

/// Telegram Bot API client.
pub struct TelegramClient {
    client: Client,
    base_url: String,
    poll_timeout_secs: u64,
}

impl TelegramClient {
    /// Create a new client.
    pub fn new(config: &TelegramConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| NewsbotError::Telegram(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: format!("{}/bot{}", config.api_url.trim_end_matches('/'), config.token),
            poll_timeout_secs: config.poll_timeout_secs,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }

    /// Long-poll for updates after `offset`.
    pub async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<Update>> {
        let mut body = serde_json::json!({
            "timeout": self.poll_timeout_secs,
            "allowed_updates": ["message"],
        });
        if let Some(offset) = offset {
            body["offset"] = serde_json::json!(offset);
        }

        let response = self
            .client
            .post(self.method_url("getUpdates"))
            .timeout(Duration::from_secs(self.poll_timeout_secs + POLL_GRACE_SECS))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                // The URL carries the bot token
                NewsbotError::Telegram(format!("getUpdates failed: {}", e.without_url()))
            })?;

        let status = response.status();
        let parsed: ApiResponse<Vec<Update>> = decode(response)
            .await
            .map_err(|e| NewsbotError::Telegram(format!("getUpdates: {}", e)))?;

        if !parsed.ok {
            return Err(NewsbotError::Telegram(format!(
                "getUpdates returned {}: {}",
                status,
                parsed.description.unwrap_or_default()
            )));
        }
        Ok(parsed.result.unwrap_or_default())
    }
}

async fn decode<T: DeserializeOwned>(
    response: reqwest::Response,
) -> std::result::Result<ApiResponse<T>, String> {
    let bytes = response
        .bytes()
        .await
        .map_err(|e| format!("failed to read response: {}", e.without_url()))?;
    serde_json::from_slice(&bytes).map_err(|e| format!("invalid response: {}", e))
}

#[async_trait]
impl MessageSender for TelegramClient {
    async fn send_message(&self, message: &OutgoingMessage) -> std::result::Result<(), DeliveryError> {
        let request = SendMessageRequest {
            chat_id: message.chat_id,
            text: &message.text,
            parse_mode: message.parse_mode.map(|m| m.as_str()),
            disable_web_page_preview: message.disable_preview,
            reply_markup: message.keyboard.as_ref(),
        };

        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .json(&request)
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(e.without_url().to_string()))?;

        let status = response.status();
        if status == StatusCode::FORBIDDEN {
            return Err(DeliveryError::Blocked);
        }

        let parsed: ApiResponse<serde_json::Value> = match decode(response).await {
            Ok(parsed) => parsed,
            Err(e) if status.is_success() => return Err(DeliveryError::Transport(e)),
            Err(_) => {
                return Err(DeliveryError::Api {
                    code: status.as_u16(),
                    description: status.to_string(),
                })
            }
        };

        if parsed.ok {
            debug!(chat_id = message.chat_id, "Message sent");
            return Ok(());
        }

        let code = parsed.error_code.unwrap_or(status.as_u16());
        match code {
            403 => Err(DeliveryError::Blocked),
            429 => Err(DeliveryError::RateLimited {
                retry_after: parsed.parameters.and_then(|p| p.retry_after),
            }),
            _ => Err(DeliveryError::Api {
                code,
                description: parsed.description.unwrap_or_default(),
            }),
        }
    }
}
