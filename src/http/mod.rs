//! HTTP protocol layer module
//!
//! Protocol-level helpers shared by the resolver and the static delegate,
//! decoupled from request dispatch.

pub mod cache;
pub mod mime;
pub mod path;
pub mod range;
pub mod response;

// Re-export commonly used types
pub use range::parse_range_header;
pub use response::{
    build_304_response, build_403_response, build_404_response, build_405_response,
    build_416_response, build_redirect_response,
};
