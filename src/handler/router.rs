//! Request dispatch module
//!
//! Entry point for HTTP request processing: method validation, clean URL
//! resolution, delegation to the static file server and access logging.

use crate::config::AppState;
use crate::handler::static_files::{StaticDelegate, StaticFiles};
use crate::http;
use crate::logger::{self, AccessLogEntry};
use crate::resolver::{self, RequestPath};
use http_body_util::Full;
use hyper::body::{Body as _, Bytes};
use hyper::header::{HeaderValue, SERVER};
use hyper::http::request::Parts;
use hyper::{Method, Request, Response, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Request context encapsulating information needed for request processing
pub struct RequestContext<'a> {
    /// Normalized request path (no query string or fragment)
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub is_head: bool,
    pub if_none_match: Option<String>,
    pub if_modified_since: Option<String>,
    pub range_header: Option<String>,
}

impl<'a> RequestContext<'a> {
    fn from_parts(parts: &'a Parts, request_path: &RequestPath<'a>) -> Self {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(ToString::to_string)
        };
        Self {
            path: request_path.normalized,
            query: parts.uri.query(),
            is_head: parts.method == Method::HEAD,
            if_none_match: header("if-none-match"),
            if_modified_since: header("if-modified-since"),
            range_header: header("range"),
        }
    }
}

/// Main entry point for HTTP request handling
///
/// The request body is never read; only retrieval methods are served.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let (parts, _) = req.into_parts();

    let raw_target = parts
        .uri
        .path_and_query()
        .map_or_else(|| parts.uri.path(), |pq| pq.as_str());
    let request_path = RequestPath::new(raw_target);
    let ctx = RequestContext::from_parts(&parts, &request_path);

    let (mut response, served_path) = match check_http_method(&parts.method) {
        Some(resp) => (resp, None),
        None => {
            let site = &state.config.site;
            let delegate = StaticFiles::new(&state.root, &site.index_files, site.directory_listing);
            let (resp, effective) =
                dispatch(&ctx, request_path, &state.root, site.clean_urls, &delegate).await;
            (resp, Some(effective))
        }
    };

    if let Ok(server) = HeaderValue::from_str(&state.config.http.server_name) {
        response.headers_mut().insert(SERVER, server);
    }

    if state.config.logging.access_log {
        let mut entry = AccessLogEntry::new(
            peer_addr.ip().to_string(),
            parts.method.to_string(),
            parts.uri.path().to_string(),
        );
        entry.served_path = served_path.filter(|p| p != ctx.path);
        entry.query = ctx.query.map(ToString::to_string);
        entry.http_version = version_label(parts.version).to_string();
        entry.status = response.status().as_u16();
        entry.body_bytes = response
            .body()
            .size_hint()
            .exact()
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0);
        entry.referer = header_string(&parts, "referer");
        entry.user_agent = header_string(&parts, "user-agent");
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Resolve the clean URL, then hand the effective path to the delegate
///
/// Returns the response together with the path that was served.
pub async fn dispatch<D: StaticDelegate>(
    ctx: &RequestContext<'_>,
    request_path: RequestPath<'_>,
    root: &Path,
    clean_urls: bool,
    delegate: &D,
) -> (Response<Full<Bytes>>, String) {
    let effective = if clean_urls {
        resolver::resolve(request_path.raw, root)
    } else {
        request_path.normalized.to_string()
    };

    if effective != request_path.normalized {
        logger::log_rewrite(request_path.normalized, &effective);
    }

    let response = delegate.serve(ctx, &effective).await;
    (response, effective)
}

/// Only retrieval methods are served
fn check_http_method(method: &Method) -> Option<Response<Full<Bytes>>> {
    match *method {
        Method::GET | Method::HEAD => None,
        _ => {
            logger::log_debug(&format!("Method not allowed: {method}"));
            Some(http::build_405_response())
        }
    }
}

fn header_string(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

const fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}
