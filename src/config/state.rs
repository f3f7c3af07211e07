// Application state module
// Holds the startup configuration and values derived from it once

use std::path::PathBuf;

use super::types::Config;

/// Application state, shared read-only across connections
pub struct AppState {
    pub config: Config,
    /// Canonical site root, resolved once at startup
    pub root: PathBuf,
}

impl AppState {
    /// Resolve the site root and build the state
    pub fn new(config: Config) -> std::io::Result<Self> {
        let root = config.resolve_root()?;
        Ok(Self { config, root })
    }

    /// Build state with an explicit root (already canonical)
    pub const fn with_root(config: Config, root: PathBuf) -> Self {
        Self { config, root }
    }
}
