//! HTTP response building module
//!
//! Provides builders for the responses the static delegate produces,
//! decoupled from request dispatch.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{
    ACCEPT_RANGES, ALLOW, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE, ETAG, LAST_MODIFIED,
    LOCATION,
};
use hyper::http::response::Builder;
use hyper::{Response, StatusCode};

use super::cache::Validators;
use super::range::ByteRange;

fn finish(builder: Builder, body: Bytes, label: &str) -> Response<Full<Bytes>> {
    builder.body(Full::new(body)).unwrap_or_else(|e| {
        log_build_error(label, &e);
        Response::new(Full::new(Bytes::new()))
    })
}

fn with_validators(mut builder: Builder, validators: &Validators) -> Builder {
    builder = builder.header(ETAG, &validators.etag);
    if let Some(last_modified) = validators.last_modified() {
        builder = builder.header(LAST_MODIFIED, last_modified);
    }
    builder
}

fn build_text_response(status: StatusCode, text: &'static str) -> Response<Full<Bytes>> {
    let builder = Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(CONTENT_LENGTH, text.len());
    finish(builder, Bytes::from_static(text.as_bytes()), status.as_str())
}

/// Build 304 Not Modified response
pub fn build_304_response(validators: &Validators) -> Response<Full<Bytes>> {
    let builder = with_validators(Response::builder().status(StatusCode::NOT_MODIFIED), validators);
    finish(builder, Bytes::new(), "304")
}

/// Build 403 Forbidden response
pub fn build_403_response() -> Response<Full<Bytes>> {
    build_text_response(StatusCode::FORBIDDEN, "403 Forbidden")
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<Full<Bytes>> {
    build_text_response(StatusCode::NOT_FOUND, "404 Not Found")
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> Response<Full<Bytes>> {
    let mut response =
        build_text_response(StatusCode::METHOD_NOT_ALLOWED, "405 Method Not Allowed");
    response
        .headers_mut()
        .insert(ALLOW, hyper::header::HeaderValue::from_static("GET, HEAD"));
    response
}

/// Build 416 Range Not Satisfiable response
pub fn build_416_response(file_size: usize) -> Response<Full<Bytes>> {
    let builder = Response::builder()
        .status(StatusCode::RANGE_NOT_SATISFIABLE)
        .header(CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(CONTENT_RANGE, format!("bytes */{file_size}"));
    finish(builder, Bytes::from_static(b"416 Range Not Satisfiable"), "416")
}

/// Build 301 redirect, used to add the trailing slash to directories
pub fn build_redirect_response(target: &str) -> Response<Full<Bytes>> {
    let builder = Response::builder()
        .status(StatusCode::MOVED_PERMANENTLY)
        .header(LOCATION, target)
        .header(CONTENT_TYPE, "text/plain; charset=utf-8");
    finish(builder, Bytes::from_static(b"Redirecting..."), "301")
}

/// Build generic HTML response
pub fn build_html_response(content: String, is_head: bool) -> Response<Full<Bytes>> {
    let content_length = content.len();
    let body = if is_head {
        Bytes::new()
    } else {
        Bytes::from(content)
    };

    let builder = Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "text/html; charset=utf-8")
        .header(CONTENT_LENGTH, content_length);
    finish(builder, body, "HTML")
}

/// Build 200 response for a whole file
pub fn build_file_response(
    data: Bytes,
    content_type: &str,
    validators: &Validators,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let content_length = data.len();
    let body = if is_head { Bytes::new() } else { data };

    let builder = Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, content_type)
        .header(CONTENT_LENGTH, content_length)
        .header(ACCEPT_RANGES, "bytes");
    finish(with_validators(builder, validators), body, "200")
}

/// Build 206 Partial Content response
pub fn build_partial_response(
    data: &Bytes,
    content_type: &str,
    validators: &Validators,
    range: ByteRange,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let body = if is_head {
        Bytes::new()
    } else {
        data.slice(range.start..=range.end)
    };

    let builder = Response::builder()
        .status(StatusCode::PARTIAL_CONTENT)
        .header(CONTENT_TYPE, content_type)
        .header(CONTENT_LENGTH, range.len())
        .header(CONTENT_RANGE, range.content_range(data.len()))
        .header(ACCEPT_RANGES, "bytes");
    finish(with_validators(builder, validators), body, "206")
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    fn validators() -> Validators {
        Validators::new(5, Some(UNIX_EPOCH + Duration::from_secs(1_000_000)))
    }

    #[test]
    fn test_error_responses() {
        assert_eq!(build_403_response().status(), StatusCode::FORBIDDEN);
        assert_eq!(build_404_response().status(), StatusCode::NOT_FOUND);
        let resp = build_405_response();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(resp.headers()[ALLOW], "GET, HEAD");
    }

    #[test]
    fn test_file_response_headers() {
        let resp = build_file_response(Bytes::from_static(b"hello"), "text/plain", &validators(), false);
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[CONTENT_LENGTH], "5");
        assert_eq!(resp.headers()[ACCEPT_RANGES], "bytes");
        assert_eq!(resp.headers()[LAST_MODIFIED], "Mon, 12 Jan 1970 13:46:40 GMT");
        assert!(resp.headers().contains_key(ETAG));
    }

    #[test]
    fn test_partial_response() {
        let data = Bytes::from_static(b"hello world");
        let range = ByteRange { start: 6, end: 10 };
        let resp = build_partial_response(&data, "text/plain", &validators(), range, false);
        assert_eq!(resp.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(resp.headers()[CONTENT_RANGE], "bytes 6-10/11");
        assert_eq!(resp.headers()[CONTENT_LENGTH], "5");
    }

    #[test]
    fn test_redirect_response() {
        let resp = build_redirect_response("/blog/");
        assert_eq!(resp.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(resp.headers()[LOCATION], "/blog/");
    }
}
