//! Clean URL resolution
//!
//! Maps an extensionless request path onto a sibling `.html` file, the way
//! static hosting platforms serve "clean URLs". `/about` is served from
//! `about.html` when neither a file nor a directory named `about` exists.
//!
//! Resolution is a pure function of the request path and the site root.
//! It only stats the filesystem and never fails: when no rewrite applies the
//! normalized path is returned and the static delegate decides the response.

use std::path::Path;

use crate::http::path::translate;

const HTML_SUFFIX: &str = ".html";

/// Request path as received, and with query string and fragment removed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestPath<'a> {
    pub raw: &'a str,
    pub normalized: &'a str,
}

impl<'a> RequestPath<'a> {
    pub fn new(raw: &'a str) -> Self {
        Self {
            raw,
            normalized: normalize(raw),
        }
    }

    /// Whether the path explicitly names a directory
    pub fn is_directory_request(&self) -> bool {
        self.normalized.ends_with('/')
    }
}

/// Strip the query string and fragment from a request target
pub fn normalize(raw: &str) -> &str {
    let end = raw.find(['?', '#']).unwrap_or(raw.len());
    &raw[..end]
}

/// Compute the path to serve for `raw_path` under `root`
///
/// The rewrite to `<path>.html` happens only when nothing exists at the
/// requested location, the path does not end in `/`, and the `.html`
/// sibling is a regular file. Existing entries always win, including
/// directories requested without a trailing slash.
pub fn resolve(raw_path: &str, root: &Path) -> String {
    let request = RequestPath::new(raw_path);
    let normalized = request.normalized;

    if request.is_directory_request() {
        return normalized.to_string();
    }

    if translate(root, normalized).exists() {
        return normalized.to_string();
    }

    // Check the sibling through the same translation the delegate applies
    let html = format!("{normalized}{HTML_SUFFIX}");
    if translate(root, &html).is_file() {
        html
    } else {
        normalized.to_string()
    }
}
