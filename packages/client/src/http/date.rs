//! HTTP date parsing and formatting (RFC 7231 IMF-fixdate)

use chrono::{DateTime, NaiveDateTime, Utc};

/// HTTP date parsing error
#[derive(Debug, Clone, thiserror::Error)]
pub enum HttpDateParseError {
    /// Date format was not recognized by any of the supported parsers
    #[error("Unrecognized HTTP date format: {0}")]
    UnrecognizedFormat(String),
}

/// Format a timestamp as `Wed, 02 Jan 2013 03:04:05 GMT`.
pub fn fmt_http_date(time: DateTime<Utc>) -> String {
    time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Parse an HTTP date in any of the three RFC 7231 formats.
pub fn parse_http_date(date_str: &str) -> Result<DateTime<Utc>, HttpDateParseError> {
    let date_str = date_str.trim();

    // IMF-fixdate (preferred): "Sun, 06 Nov 1994 08:49:37 GMT"
    if let Ok(dt) = NaiveDateTime::parse_from_str(date_str, "%a, %d %b %Y %H:%M:%S GMT") {
        return Ok(dt.and_utc());
    }

    // RFC 850: "Sunday, 06-Nov-94 08:49:37 GMT"
    if let Ok(dt) = NaiveDateTime::parse_from_str(date_str, "%A, %d-%b-%y %H:%M:%S GMT") {
        return Ok(dt.and_utc());
    }

    // ANSI C asctime(): "Sun Nov  6 08:49:37 1994"
    if let Ok(dt) = NaiveDateTime::parse_from_str(date_str, "%a %b %e %H:%M:%S %Y") {
        return Ok(dt.and_utc());
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(date_str) {
        return Ok(dt.with_timezone(&Utc));
    }

    Err(HttpDateParseError::UnrecognizedFormat(date_str.to_string()))
}
