//! Local static-site preview server with clean URL resolution.
//!
//! Serves a directory over HTTP/1.1. A request for `/about` that matches
//! no file or directory is served from `about.html` when it exists, the
//! way static hosting platforms resolve clean URLs.

pub mod config;
pub mod handler;
pub mod http;
pub mod logger;
pub mod resolver;
pub mod server;
