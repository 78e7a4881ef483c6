//! Input validation for keywords, sources and polling intervals.
//!
//! Validation errors are shown to the user verbatim, so their messages
//! are written as chat replies.

use thiserror::Error;
use url::Url;

use crate::config::{MAX_USER_INTERVAL_SECS, MIN_USER_INTERVAL_SECS};

/// Minimum keyword length in characters.
pub const MIN_KEYWORD_LENGTH: usize = 2;

/// Maximum keyword length in characters.
pub const MAX_KEYWORD_LENGTH: usize = 50;

/// Maximum source name length in characters.
pub const MAX_SOURCE_NAME_LENGTH: usize = 100;

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Input contained no keywords at all.
    #[error("no keywords given")]
    NoKeywords,

    /// Keyword is too short.
    #[error("keyword must be at least {MIN_KEYWORD_LENGTH} characters")]
    KeywordTooShort,

    /// Keyword is too long.
    #[error("keyword must be at most {MAX_KEYWORD_LENGTH} characters")]
    KeywordTooLong,

    /// Keyword contains invalid characters.
    #[error("keyword can only contain letters, digits, spaces, hyphens, periods and commas")]
    KeywordInvalidChars,

    /// Adding the keywords would exceed the per-user cap.
    #[error("keyword limit reached: at most {max} keywords per user")]
    KeywordLimitExceeded {
        /// The configured cap.
        max: usize,
    },

    /// Source input is not in `name | url` form.
    #[error("source must be given as: name | url")]
    SourceFormat,

    /// Source name is too long.
    #[error("source name must be at most {MAX_SOURCE_NAME_LENGTH} characters")]
    SourceNameTooLong,

    /// Source URL is not a valid http(s) URL.
    #[error("source URL must be a valid http or https URL")]
    SourceUrl,

    /// An active source with this URL already exists.
    #[error("this source is already in the list")]
    SourceExists,

    /// Source id is not a number.
    #[error("send the number of the source to remove")]
    SourceIdNotNumber,

    /// Interval is not an integer.
    #[error("interval must be a whole number of seconds")]
    IntervalNotNumber,

    /// Interval is out of range.
    #[error(
        "interval must be between {MIN_USER_INTERVAL_SECS} and {MAX_USER_INTERVAL_SECS} seconds"
    )]
    IntervalOutOfRange,
}

/// Validate a single keyword and return its case-folded form.
///
/// Requirements:
/// - Length: 2-50 characters after trimming
/// - Characters: letters, digits, space, hyphen, period, comma
///
/// # Examples
///
/// ```
/// use newsbot::subscription::validation::validate_keyword;
///
/// assert_eq!(validate_keyword("  Bitcoin ").unwrap(), "bitcoin");
/// assert!(validate_keyword("a").is_err()); // too short
/// assert!(validate_keyword("eth$").is_err()); // invalid char
/// ```
pub fn validate_keyword(keyword: &str) -> Result<String, ValidationError> {
    let keyword = keyword.trim();
    // Folding can change the length, so measure what gets stored
    let folded = keyword.to_lowercase();
    let len = folded.chars().count();

    if len < MIN_KEYWORD_LENGTH {
        return Err(ValidationError::KeywordTooShort);
    }
    if len > MAX_KEYWORD_LENGTH {
        return Err(ValidationError::KeywordTooLong);
    }
    if !keyword
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '.' | ','))
    {
        return Err(ValidationError::KeywordInvalidChars);
    }

    Ok(folded)
}

/// Split comma-separated keyword input into trimmed, non-empty items.
pub fn parse_keyword_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Validate a polling interval given as text.
pub fn validate_interval(raw: &str) -> Result<i64, ValidationError> {
    let seconds: i64 = raw
        .trim()
        .parse()
        .map_err(|_| ValidationError::IntervalNotNumber)?;

    if !(MIN_USER_INTERVAL_SECS..=MAX_USER_INTERVAL_SECS).contains(&seconds) {
        return Err(ValidationError::IntervalOutOfRange);
    }
    Ok(seconds)
}

/// Parse `name | url` source input.
///
/// Returns the trimmed name and the URL as given.
pub fn parse_source_input(raw: &str) -> Result<(String, String), ValidationError> {
    let (name, url) = raw.split_once('|').ok_or(ValidationError::SourceFormat)?;
    let name = name.trim();
    let url = url.trim();

    if name.is_empty() || url.is_empty() {
        return Err(ValidationError::SourceFormat);
    }
    if name.chars().count() > MAX_SOURCE_NAME_LENGTH {
        return Err(ValidationError::SourceNameTooLong);
    }

    let parsed = Url::parse(url).map_err(|_| ValidationError::SourceUrl)?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(ValidationError::SourceUrl);
    }

    Ok((name.to_string(), url.to_string()))
}

/// Parse a source id typed by the user.
pub fn parse_source_id(raw: &str) -> Result<i64, ValidationError> {
    raw.trim()
        .trim_start_matches('#')
        .parse()
        .map_err(|_| ValidationError::SourceIdNotNumber)
}
