//! URL path to filesystem path translation

use percent_encoding::percent_decode_str;
use std::path::{Path, PathBuf};

/// Join a URL path onto `root`
///
/// The path is percent-decoded and split on `/`; empty and `.` segments
/// are dropped. `..` segments are kept as-is: containment within `root`
/// is checked by the caller after canonicalization.
pub fn translate(root: &Path, url_path: &str) -> PathBuf {
    let decoded = percent_decode_str(url_path).decode_utf8_lossy();
    let mut path = root.to_path_buf();
    for segment in decoded.split('/') {
        if segment.is_empty() || segment == "." {
            continue;
        }
        path.push(segment);
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_plain() {
        let root = Path::new("/srv/site");
        assert_eq!(translate(root, "/blog/post"), root.join("blog").join("post"));
        assert_eq!(translate(root, "/"), root);
        assert_eq!(translate(root, ""), root);
    }

    #[test]
    fn test_translate_decodes() {
        let root = Path::new("/srv/site");
        assert_eq!(translate(root, "/my%20page"), root.join("my page"));
    }

    #[test]
    fn test_translate_never_replaces_root() {
        let root = Path::new("/srv/site");
        assert_eq!(translate(root, "//etc/passwd"), root.join("etc").join("passwd"));
        assert_eq!(translate(root, "/%2Fetc"), root.join("etc"));
    }

    #[test]
    fn test_translate_keeps_parent_segments() {
        let root = Path::new("/srv/site");
        assert_eq!(translate(root, "/../x"), root.join("..").join("x"));
        assert_eq!(translate(root, "/./a/./b"), root.join("a").join("b"));
    }
}
