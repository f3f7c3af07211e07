//! Static file serving module
//!
//! The delegate behind the clean URL resolver: maps an effective path onto
//! the site root, enforces containment, serves files, index files and
//! directory listings, and owns every error response.

use crate::handler::router::RequestContext;
use crate::http::{self, cache::Validators, mime, path, range::RangeParseResult};
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use std::fmt::Write as _;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Characters escaped in directory listing links
const LINK_ESCAPE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`');

/// Serves an already-resolved path
///
/// Implementations own all client-facing errors (404, 403, ...).
pub trait StaticDelegate {
    fn serve(
        &self,
        ctx: &RequestContext<'_>,
        path: &str,
    ) -> impl Future<Output = Response<Full<Bytes>>> + Send;
}

/// Why a path could not be served
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadError {
    NotFound,
    Forbidden,
}

impl From<io::Error> for LoadError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::PermissionDenied => Self::Forbidden,
            _ => Self::NotFound,
        }
    }
}

/// What a path resolved to on disk
#[derive(Debug)]
pub enum Loaded {
    File {
        content: Bytes,
        content_type: String,
        validators: Validators,
    },
    /// Directory requested without trailing slash
    Redirect(String),
    /// Generated listing for a directory without index file
    Listing(String),
}

/// Filesystem-backed delegate rooted at the site directory
#[derive(Debug, Clone, Copy)]
pub struct StaticFiles<'a> {
    /// Canonical site root
    root: &'a Path,
    index_files: &'a [String],
    directory_listing: bool,
}

impl<'a> StaticFiles<'a> {
    pub const fn new(root: &'a Path, index_files: &'a [String], directory_listing: bool) -> Self {
        Self {
            root,
            index_files,
            directory_listing,
        }
    }

    /// Load whatever `url_path` names under the root
    pub async fn load(&self, url_path: &str, query: Option<&str>) -> Result<Loaded, LoadError> {
        if escapes_root(url_path) {
            logger::log_warning(&format!("Path traversal attempt blocked: {url_path}"));
            return Err(LoadError::Forbidden);
        }

        let target = path::translate(self.root, url_path);
        let canonical = fs::canonicalize(&target).await?;
        if !canonical.starts_with(self.root) {
            logger::log_warning(&format!(
                "Path outside site root blocked: {} -> {}",
                url_path,
                canonical.display()
            ));
            return Err(LoadError::Forbidden);
        }

        let meta = fs::metadata(&canonical).await?;
        if !meta.is_dir() {
            return read_file(&canonical, &meta, &target).await;
        }

        if !url_path.ends_with('/') {
            let location = match query {
                Some(q) => format!("{url_path}/?{q}"),
                None => format!("{url_path}/"),
            };
            return Ok(Loaded::Redirect(location));
        }

        if let Some((index, index_meta)) = self.find_index(&canonical).await {
            return read_file(&index, &index_meta, &index).await;
        }

        if self.directory_listing {
            return Ok(Loaded::Listing(render_listing(&canonical, url_path).await?));
        }
        Err(LoadError::NotFound)
    }

    async fn find_index(&self, dir: &Path) -> Option<(PathBuf, std::fs::Metadata)> {
        for name in self.index_files {
            let candidate = dir.join(name);
            if let Ok(meta) = fs::metadata(&candidate).await {
                if meta.is_file() {
                    return Some((candidate, meta));
                }
            }
        }
        None
    }
}

impl StaticDelegate for StaticFiles<'_> {
    async fn serve(&self, ctx: &RequestContext<'_>, path: &str) -> Response<Full<Bytes>> {
        match self.load(path, ctx.query).await {
            Ok(Loaded::File {
                content,
                content_type,
                validators,
            }) => build_static_file_response(ctx, &content, &content_type, &validators),
            Ok(Loaded::Redirect(location)) => http::build_redirect_response(&location),
            Ok(Loaded::Listing(html)) => http::response::build_html_response(html, ctx.is_head),
            Err(LoadError::Forbidden) => http::build_403_response(),
            Err(LoadError::NotFound) => http::build_404_response(),
        }
    }
}

/// Separators the filesystem treats as path boundaries
#[cfg(windows)]
const SEPARATORS: &[char] = &['/', '\\'];
#[cfg(not(windows))]
const SEPARATORS: &[char] = &['/'];

/// Whether `..` segments would climb above the root
fn escapes_root(url_path: &str) -> bool {
    let decoded = percent_encoding::percent_decode_str(url_path).decode_utf8_lossy();
    let mut depth: usize = 0;
    for segment in decoded.split(SEPARATORS) {
        match segment {
            "" | "." => {}
            ".." => match depth.checked_sub(1) {
                Some(d) => depth = d,
                None => return true,
            },
            _ => depth += 1,
        }
    }
    false
}

/// Read `file_path`; the content type follows `requested`, the name the client asked for
async fn read_file(
    file_path: &Path,
    meta: &std::fs::Metadata,
    requested: &Path,
) -> Result<Loaded, LoadError> {
    let content = fs::read(file_path).await.map_err(|e| {
        if e.kind() != io::ErrorKind::NotFound {
            logger::log_error(&format!(
                "Failed to read file '{}': {}",
                file_path.display(),
                e
            ));
        }
        LoadError::from(e)
    })?;

    Ok(Loaded::File {
        content: Bytes::from(content),
        content_type: mime::get_content_type(requested),
        validators: Validators::from_metadata(meta),
    })
}

/// Render an HTML listing of `dir`, directories first-class with a `/`
async fn render_listing(dir: &Path, url_path: &str) -> Result<String, LoadError> {
    let mut entries = fs::read_dir(dir).await?;
    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let mut name = entry.file_name().to_string_lossy().into_owned();
        if entry.file_type().await.is_ok_and(|t| t.is_dir()) {
            name.push('/');
        }
        names.push(name);
    }
    names.sort_by_key(|n| n.to_lowercase());

    let display_path = percent_encoding::percent_decode_str(url_path).decode_utf8_lossy();
    let title = format!("Directory listing for {}", escape_html(&display_path));
    let mut html = format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n</head>\n<body>\n<h1>{title}</h1>\n<hr>\n<ul>\n"
    );
    for name in &names {
        let _ = writeln!(
            html,
            "<li><a href=\"{}\">{}</a></li>",
            utf8_percent_encode(name, LINK_ESCAPE),
            escape_html(name)
        );
    }
    html.push_str("</ul>\n<hr>\n</body>\n</html>\n");
    Ok(html)
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Build static file response with validators and Range support
fn build_static_file_response(
    ctx: &RequestContext<'_>,
    data: &Bytes,
    content_type: &str,
    validators: &Validators,
) -> Response<Full<Bytes>> {
    if validators.not_modified(ctx.if_none_match.as_deref(), ctx.if_modified_since.as_deref()) {
        return http::build_304_response(validators);
    }

    match http::parse_range_header(ctx.range_header.as_deref(), data.len()) {
        RangeParseResult::Valid(range) => http::response::build_partial_response(
            data,
            content_type,
            validators,
            range,
            ctx.is_head,
        ),
        RangeParseResult::NotSatisfiable => http::build_416_response(data.len()),
        RangeParseResult::None => {
            http::response::build_file_response(data.clone(), content_type, validators, ctx.is_head)
        }
    }
}
