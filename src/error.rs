//! Unified error types.

use std::path::PathBuf;

use thiserror::Error;

/// The error type returned by the framework's fallible operations.
///
/// Application-level outcomes (404, 400, a failing sanitizer's 500) are
/// expressed as [`Response`](crate::Response) values, not as `Error`s. This
/// type surfaces infrastructure and startup failures: binding to a port,
/// parsing the listen address, or loading the disinfect configuration.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid socket address `{addr}`: {source}")]
    Addr {
        addr: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("config: {0}")]
    Config(#[from] ConfigError),
}

/// Raised once, at load or registration time, when disinfect options do not
/// match the schema. Never produced while serving requests.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid options: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid options: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("unsupported config format for {} (expected .json or .toml)", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("invalid route setting: {0}")]
    RouteSetting(String),
}
