//! Shared types, error model, and configuration for remote content embedding.
//!
//! This crate is the foundation depended on by all other workspace crates.
//! It provides:
//! - [`RemoteContentError`] — the unified error type
//! - Domain types ([`RemoteContentSpec`], [`RelativePathSetting`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DEFAULT_ROOT_URL, HttpConfig, RenderConfig, SourceConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from,
};
pub use error::{RemoteContentError, Result};
pub use types::{MAX_REMOTE_PATH_LEN, RelativePathSetting, RemoteContentSpec};
