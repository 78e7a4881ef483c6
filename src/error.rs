//! Error types for newsbot.

use thiserror::Error;

use crate::subscription::ValidationError;
use crate::telegram::DeliveryError;

/// Common error type for newsbot.
#[derive(Error, Debug)]
pub enum NewsbotError {
    /// Database error.
    ///
    /// Errors from sqlx are converted into this variant.
    #[error("database error: {0}")]
    Database(String),

    /// Database connection error.
    #[error("database connection error: {0}")]
    DatabaseConnection(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid user input (keyword, source, interval).
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// A source could not be fetched or parsed.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// A message could not be delivered.
    #[error("delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    /// Telegram API error outside of message delivery (e.g. getUpdates).
    #[error("telegram error: {0}")]
    Telegram(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<sqlx::Error> for NewsbotError {
    fn from(e: sqlx::Error) -> Self {
        NewsbotError::Database(e.to_string())
    }
}

/// Result type alias for newsbot operations.
pub type Result<T> = std::result::Result<T, NewsbotError>;
