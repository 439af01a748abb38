//! Shared utility functions for the EvoTrack application.

use axum::http::HeaderMap;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};

/// Extract a Bearer token from the Authorization header.
///
/// Returns the token string without the "Bearer " prefix, or None if
/// the header is missing, malformed, or empty after the prefix.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
}

/// Render a unix timestamp as an RFC 3339 string (UTC).
pub fn to_rfc3339(secs: i64) -> String {
    Utc.timestamp_opt(secs, 0)
        .single()
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_default()
}

/// Parse an RFC 3339 timestamp, or a bare `YYYY-MM-DD` date taken as
/// midnight UTC, into unix seconds.
pub fn parse_datetime(s: &str) -> Option<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ndt| Utc.from_utc_datetime(&ndt).timestamp())
}

/// Redact an email for viewers who may not see it: keep the first character
/// of the local part and the full domain, e.g. `j***@example.com`.
pub fn redact_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let first = local.chars().next().map(String::from).unwrap_or_default();
            format!("{}***@{}", first, domain)
        }
        None => "***".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_local_part_keeping_domain() {
        assert_eq!(redact_email("jane@example.com"), "j***@example.com");
        assert_eq!(redact_email("a@b.co"), "a***@b.co");
    }

    #[test]
    fn redacts_garbage_without_at_sign() {
        assert_eq!(redact_email("not-an-email"), "***");
    }

    #[test]
    fn parses_rfc3339_and_bare_dates() {
        assert_eq!(parse_datetime("1970-01-01T00:00:00Z"), Some(0));
        assert_eq!(parse_datetime("1970-01-02"), Some(86400));
        assert_eq!(parse_datetime("yesterday"), None);
    }
}
