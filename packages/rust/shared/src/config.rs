//! Application configuration for remote content embedding.
//!
//! User config lives at `~/.remotecontent/remotecontent.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{RemoteContentError, Result};
use crate::types::RelativePathSetting;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "remotecontent.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".remotecontent";

/// Origin that remote paths resolve against when nothing is configured.
pub const DEFAULT_ROOT_URL: &str = "https://tacc.utexas.edu/";

// ---------------------------------------------------------------------------
// Config structs (matching remotecontent.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Where remote content comes from and which URLs stay relative.
    #[serde(default)]
    pub source: SourceConfig,

    /// Render behaviour.
    #[serde(default)]
    pub render: RenderConfig,

    /// HTTP client settings for the fetch collaborator.
    #[serde(default)]
    pub http: HttpConfig,
}

/// `[source]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Remote origin (scheme + authority + optional path prefix).
    #[serde(default = "default_root_url")]
    pub root_url: String,

    /// Keep-relative policy: a flag or a list of selectors.
    #[serde(default)]
    pub use_relative_paths: RelativePathSetting,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            root_url: default_root_url(),
            use_relative_paths: RelativePathSetting::default(),
        }
    }
}

fn default_root_url() -> String {
    DEFAULT_ROOT_URL.into()
}

/// `[render]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Surface a diagnostic string instead of silently empty output.
    #[serde(default)]
    pub debug_mode: bool,
}

/// `[http]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum redirects followed per fetch.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_redirects: default_max_redirects(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}
fn default_max_redirects() -> usize {
    5
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.remotecontent/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| RemoteContentError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.remotecontent/remotecontent.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| RemoteContentError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        RemoteContentError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| RemoteContentError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| RemoteContentError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| RemoteContentError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("root_url"));
        assert!(toml_str.contains("use_relative_paths = false"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.source.root_url, DEFAULT_ROOT_URL);
        assert_eq!(parsed.source.use_relative_paths, RelativePathSetting::Flag(false));
        assert!(!parsed.render.debug_mode);
        assert_eq!(parsed.http.timeout_secs, 30);
    }

    #[test]
    fn config_with_selector_policy() {
        let toml_str = r#"
[source]
root_url = "https://example.com/path/"
use_relative_paths = [
    'img.local-asset',
    'a[href^="/docs/"]',
]

[render]
debug_mode = true
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.source.root_url, "https://example.com/path/");
        assert!(config.render.debug_mode);
        match &config.source.use_relative_paths {
            RelativePathSetting::Selectors(list) => {
                assert_eq!(list.len(), 2);
                assert_eq!(list[1], r#"a[href^="/docs/"]"#);
            }
            other => panic!("expected selectors, got {other:?}"),
        }
    }

    #[test]
    fn empty_file_uses_defaults() {
        let config: AppConfig = toml::from_str("").expect("parse");
        assert_eq!(config.source.root_url, DEFAULT_ROOT_URL);
        assert_eq!(config.http.max_redirects, 5);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = load_config_from(Path::new("/nonexistent/remotecontent.toml")).unwrap_err();
        assert!(matches!(err, RemoteContentError::Io { .. }));
    }
}
