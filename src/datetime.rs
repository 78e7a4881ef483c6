//! Date/time utilities for newsbot.

use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;

/// Storage format for timestamps in SQLite (always UTC).
pub const SQL_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Display format used in delivered messages.
pub const DISPLAY_FORMAT: &str = "%d.%m.%Y %H:%M";

/// Parse a stored datetime string.
///
/// Accepts RFC3339 and the SQLite `datetime('now')` format, which is assumed to be UTC.
pub fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, SQL_DATETIME_FORMAT) {
        return Some(naive.and_utc());
    }
    None
}

/// Format a UTC datetime for storage.
pub fn to_sql_datetime(dt: &DateTime<Utc>) -> String {
    dt.format(SQL_DATETIME_FORMAT).to_string()
}

/// Format a DateTime<Utc> to the specified timezone.
///
/// # Arguments
///
/// * `dt` - DateTime in UTC
/// * `timezone` - Timezone name (e.g., "Europe/Moscow", "UTC")
/// * `format` - Output format string (e.g., "%d.%m.%Y %H:%M")
///
/// Falls back to UTC when the timezone name is unknown.
pub fn format_utc_datetime(dt: &DateTime<Utc>, timezone: &str, format: &str) -> String {
    let tz: Tz = match timezone.parse() {
        Ok(tz) => tz,
        Err(_) => return dt.format(format).to_string(),
    };
    dt.with_timezone(&tz).format(format).to_string()
}

/// Convert a millisecond Unix timestamp to a UTC datetime.
pub fn from_millis(ms: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_datetime_rfc3339() {
        let dt = parse_datetime("2024-01-15T10:30:00+03:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 1, 15, 7, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_datetime_sqlite() {
        let dt = parse_datetime("2024-01-15 10:30:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_datetime_invalid() {
        assert!(parse_datetime("not a date").is_none());
        assert!(parse_datetime("").is_none());
    }

    #[test]
    fn test_to_sql_datetime_roundtrip() {
        let dt = Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap();
        let s = to_sql_datetime(&dt);
        assert_eq!(s, "2024-12-31 23:59:59");
        assert_eq!(parse_datetime(&s), Some(dt));
    }

    #[test]
    fn test_format_utc_datetime() {
        let dt = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        let result = format_utc_datetime(&dt, "Europe/Moscow", DISPLAY_FORMAT);
        assert_eq!(result, "15.01.2024 13:30"); // UTC+3
    }

    #[test]
    fn test_format_utc_datetime_invalid_timezone() {
        let dt = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        let result = format_utc_datetime(&dt, "Invalid/Zone", DISPLAY_FORMAT);
        assert_eq!(result, "15.01.2024 10:30");
    }

    #[test]
    fn test_from_millis() {
        let dt = from_millis(1_705_314_600_000).unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap());
    }
}
