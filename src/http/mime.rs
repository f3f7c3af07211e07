//! MIME type detection module
//!
//! Returns the Content-Type for a served file based on its extension.

use mime_guess::mime::{APPLICATION, JAVASCRIPT, TEXT};
use std::path::Path;

/// Get Content-Type for a file path
///
/// Text types carry an explicit UTF-8 charset; unknown extensions fall
/// back to `application/octet-stream`.
pub fn get_content_type(path: &Path) -> String {
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    let textual = mime.type_() == TEXT
        || (mime.type_() == APPLICATION && mime.subtype() == JAVASCRIPT);
    if textual && mime.get_param("charset").is_none() {
        format!("{}; charset=utf-8", mime.essence_str())
    } else {
        mime.to_string()
    }
}
