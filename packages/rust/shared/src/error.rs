//! Failures that can cross a crate boundary.
//!
//! Only three seams are fallible: loading configuration, validating a remote
//! path, and the HTTP fetch. Rewriting never fails, and the renderer turns
//! fetch errors into an empty outcome, so these mostly surface in the CLI.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum RemoteContentError {
    /// The config file could not be parsed or written.
    #[error("config error: {message}")]
    Config { message: String },

    /// The origin was unreachable or the body could not be read.
    #[error("network error: {0}")]
    Network(String),

    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Rejected input: a blank or overlong remote path, an oversized response.
    #[error("validation error: {message}")]
    Validation { message: String },
}

pub type Result<T> = std::result::Result<T, RemoteContentError>;

impl RemoteContentError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Prefixes the failing URL so log lines name the origin.
    pub fn network(url: &str, detail: impl std::fmt::Display) -> Self {
        Self::Network(format!("{url}: {detail}"))
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
