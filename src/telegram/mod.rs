//! Telegram messaging channel for newsbot.
//!
//! [`MessageSender`] is the seam the dispatcher and the bot handler send
//! through; [`TelegramClient`] implements it over the Bot API.

pub mod client;
pub mod types;

pub use client::TelegramClient;
pub use types::{IncomingMessage, ReplyKeyboardMarkup, Update};

use async_trait::async_trait;
use thiserror::Error;

/// Why a message could not be delivered.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// The user blocked the bot (HTTP 403).
    #[error("bot was blocked by the user")]
    Blocked,

    /// Flood limit hit (HTTP 429).
    #[error("rate limited, retry after {retry_after:?}s")]
    RateLimited {
        /// Seconds to wait, when the API says.
        retry_after: Option<u64>,
    },

    /// Any other API error.
    #[error("API error {code}: {description}")]
    Api {
        /// Error code.
        code: u16,
        /// Error description.
        description: String,
    },

    /// Network or decoding failure.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Text formatting mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    /// Telegram's HTML subset.
    Html,
}

impl ParseMode {
    /// Wire value.
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseMode::Html => "HTML",
        }
    }
}

/// A message to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    /// Target chat.
    pub chat_id: i64,
    /// Message text.
    pub text: String,
    /// Formatting mode, plain text when unset.
    pub parse_mode: Option<ParseMode>,
    /// Reply keyboard to show.
    pub keyboard: Option<ReplyKeyboardMarkup>,
    /// Suppress link previews.
    pub disable_preview: bool,
}

impl OutgoingMessage {
    /// Create a plain-text message.
    pub fn new(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            parse_mode: None,
            keyboard: None,
            disable_preview: false,
        }
    }

    /// Render the text as HTML.
    pub fn html(mut self) -> Self {
        self.parse_mode = Some(ParseMode::Html);
        self
    }

    /// Attach a reply keyboard.
    pub fn with_keyboard(mut self, keyboard: ReplyKeyboardMarkup) -> Self {
        self.keyboard = Some(keyboard);
        self
    }

    /// Disable link previews.
    pub fn without_preview(mut self) -> Self {
        self.disable_preview = true;
        self
    }
}

/// Something that can deliver a message to a chat.
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Deliver one message.
    async fn send_message(&self, message: &OutgoingMessage) -> Result<(), DeliveryError>;
}
