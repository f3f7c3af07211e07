// Configuration module entry point
// Loads layered configuration (defaults, file, environment, command line)

mod state;
mod types;

use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

// Re-export public types
pub use state::AppState;
pub use types::{Config, HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig, SiteConfig};

/// Default config file name (without extension)
pub const DEFAULT_CONFIG_FILE: &str = "cleanserve";

/// Environment variable prefix, e.g. `CLEANSERVE_SERVER__PORT=9000`
const ENV_PREFIX: &str = "CLEANSERVE";

/// Values given on the command line, applied on top of file and environment
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub root: Option<String>,
    pub disable_clean_urls: bool,
}

impl Config {
    /// Load configuration from specified file path (without extension)
    /// A missing file is not an error; defaults and environment still apply
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000)?
            .set_default("site.clean_urls", true)?
            .set_default("site.directory_listing", true)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("http.server_name", concat!("cleanserve/", env!("CARGO_PKG_VERSION")))?
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Apply command line overrides
    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(host) = overrides.host {
            self.server.host = host;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(root) = overrides.root {
            self.site.root = Some(root);
        }
        if overrides.disable_clean_urls {
            self.site.clean_urls = false;
        }
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    /// Resolve the site root to an absolute, canonical directory
    ///
    /// Falls back to the directory containing the running executable.
    pub fn resolve_root(&self) -> io::Result<PathBuf> {
        let root = match &self.site.root {
            Some(dir) => PathBuf::from(dir),
            None => executable_dir()?,
        };
        let root = root.canonicalize().map_err(|e| {
            io::Error::new(e.kind(), format!("Site root '{}': {e}", root.display()))
        })?;
        if !root.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Site root '{}' is not a directory", root.display()),
            ));
        }
        Ok(root)
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

fn executable_dir() -> io::Result<PathBuf> {
    let exe = std::env::current_exe()?;
    exe.parent().map(Path::to_path_buf).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            "Executable has no parent directory",
        )
    })
}
