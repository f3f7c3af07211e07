//! Validator module
//!
//! `ETag` and `Last-Modified` generation and conditional request checks,
//! so edited files are always refetched while unchanged ones revalidate
//! with 304.

use chrono::{DateTime, Utc};
use std::fs::Metadata;
use std::time::{SystemTime, UNIX_EPOCH};

/// HTTP-date format (IMF-fixdate)
const HTTP_DATE: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Response validators for one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validators {
    /// Quoted `ETag` derived from size and modification time
    pub etag: String,
    /// Modification time, truncated to seconds
    pub modified: Option<DateTime<Utc>>,
}

impl Validators {
    pub fn from_metadata(meta: &Metadata) -> Self {
        Self::new(meta.len(), meta.modified().ok())
    }

    pub fn new(len: u64, modified: Option<SystemTime>) -> Self {
        let nanos = modified
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map_or(0, |d| d.as_nanos());
        let modified = modified
            .map(DateTime::<Utc>::from)
            .and_then(|t| DateTime::from_timestamp(t.timestamp(), 0));
        Self {
            etag: format!("\"{nanos:x}-{len:x}\""),
            modified,
        }
    }

    /// `Last-Modified` header value
    pub fn last_modified(&self) -> Option<String> {
        self.modified.map(|t| t.format(HTTP_DATE).to_string())
    }

    /// Whether the client's cached copy is still current
    ///
    /// `If-None-Match` takes precedence; `If-Modified-Since` is only
    /// consulted when it is absent.
    pub fn not_modified(&self, if_none_match: Option<&str>, if_modified_since: Option<&str>) -> bool {
        if let Some(client_etags) = if_none_match {
            return check_etag_match(client_etags, &self.etag);
        }
        match (if_modified_since.and_then(parse_http_date), self.modified) {
            (Some(since), Some(modified)) => modified <= since,
            _ => false,
        }
    }
}

/// Check if client's `If-None-Match` header matches the server's `ETag`
///
/// Supports a single `ETag`, a comma-separated list, weak tags and `*`.
pub fn check_etag_match(if_none_match: &str, etag: &str) -> bool {
    if_none_match.split(',').map(str::trim).any(|e| {
        e == "*" || e.strip_prefix("W/").unwrap_or(e) == etag
    })
}

/// Parse an HTTP-date header value
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn validators() -> Validators {
        // 2024-01-02T03:04:05.5Z
        let mtime = UNIX_EPOCH + Duration::from_millis(1_704_164_645_500);
        Validators::new(1234, Some(mtime))
    }

    #[test]
    fn test_etag_format() {
        let v = validators();
        assert!(v.etag.starts_with('"'));
        assert!(v.etag.ends_with("-4d2\""));
    }

    #[test]
    fn test_etag_changes_with_content() {
        let mtime = UNIX_EPOCH + Duration::from_secs(1_000);
        assert_ne!(
            Validators::new(10, Some(mtime)).etag,
            Validators::new(11, Some(mtime)).etag
        );
        assert_ne!(
            Validators::new(10, Some(mtime)).etag,
            Validators::new(10, Some(mtime + Duration::from_millis(1))).etag
        );
    }

    #[test]
    fn test_last_modified() {
        assert_eq!(
            validators().last_modified().as_deref(),
            Some("Tue, 02 Jan 2024 03:04:05 GMT")
        );
        assert_eq!(Validators::new(0, None).last_modified(), None);
    }

    #[test]
    fn test_check_etag_match() {
        let etag = "\"abc123\"";
        assert!(check_etag_match("\"abc123\"", etag));
        assert!(check_etag_match("\"xyz\", \"abc123\"", etag));
        assert!(check_etag_match("W/\"abc123\"", etag));
        assert!(check_etag_match("*", etag));
        assert!(!check_etag_match("\"different\"", etag));
    }

    #[test]
    fn test_not_modified_by_etag() {
        let v = validators();
        assert!(v.not_modified(Some(&v.etag), None));
        // A stale ETag wins over a fresh date
        assert!(!v.not_modified(Some("\"old\""), Some("Wed, 03 Jan 2024 00:00:00 GMT")));
    }

    #[test]
    fn test_not_modified_by_date() {
        let v = validators();
        assert!(v.not_modified(None, Some("Tue, 02 Jan 2024 03:04:05 GMT")));
        assert!(v.not_modified(None, Some("Wed, 03 Jan 2024 00:00:00 GMT")));
        assert!(!v.not_modified(None, Some("Mon, 01 Jan 2024 00:00:00 GMT")));
        assert!(!v.not_modified(None, Some("not a date")));
        assert!(!v.not_modified(None, None));
    }
}
