//! Request handler module
//!
//! Request dispatch and the static file delegate it hands resolved paths to.

pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::handle_request;
pub use static_files::{StaticDelegate, StaticFiles};
