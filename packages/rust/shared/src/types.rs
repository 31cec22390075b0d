//! Core domain types: the per-embedding spec and the keep-relative setting.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{RemoteContentError, Result};

/// Maximum length of a stored remote path.
pub const MAX_REMOTE_PATH_LEN: usize = 255;

// ---------------------------------------------------------------------------
// RemoteContentSpec
// ---------------------------------------------------------------------------

/// One embedding point: which page to fetch from the configured root.
///
/// The full fetch URL is never stored here; it is resolved against the root
/// at render time because the root can change with configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRemoteContentSpec")]
pub struct RemoteContentSpec {
    /// Origin-relative path, e.g. `news/latest-news/tag/lccf/`. May carry its
    /// own query string and fragment.
    pub remote_path: String,
}

impl RemoteContentSpec {
    /// Build a spec, rejecting blank or oversized paths.
    pub fn new(remote_path: impl Into<String>) -> Result<Self> {
        let remote_path = remote_path.into();

        if remote_path.trim().is_empty() {
            return Err(RemoteContentError::validation("remote path is required"));
        }

        let len = remote_path.chars().count();
        if len > MAX_REMOTE_PATH_LEN {
            return Err(RemoteContentError::validation(format!(
                "remote path is {len} characters, max {MAX_REMOTE_PATH_LEN}"
            )));
        }

        Ok(Self { remote_path })
    }
}

/// Unvalidated shape of a spec; deserialization goes through
/// [`RemoteContentSpec::new`].
#[derive(Deserialize)]
struct RawRemoteContentSpec {
    remote_path: String,
}

impl TryFrom<RawRemoteContentSpec> for RemoteContentSpec {
    type Error = RemoteContentError;

    fn try_from(raw: RawRemoteContentSpec) -> Result<Self> {
        Self::new(raw.remote_path)
    }
}

impl std::fmt::Display for RemoteContentSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.remote_path)
    }
}

// ---------------------------------------------------------------------------
// RelativePathSetting
// ---------------------------------------------------------------------------

/// The `use_relative_paths` configuration value.
///
/// Either a flag (`true` keeps every URL relative, `false` rewrites all) or an
/// ordered list of CSS selectors naming the elements to keep relative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RelativePathSetting {
    Flag(bool),
    Selectors(Vec<String>),
}

impl Default for RelativePathSetting {
    fn default() -> Self {
        Self::Flag(false)
    }
}

/// Accepts any value so a misconfigured setting degrades instead of failing
/// the whole config file.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawRelativePathSetting {
    Flag(bool),
    Selectors(Vec<String>),
    Other(serde::de::IgnoredAny),
}

impl From<RawRelativePathSetting> for RelativePathSetting {
    fn from(raw: RawRelativePathSetting) -> Self {
        match raw {
            RawRelativePathSetting::Flag(flag) => Self::Flag(flag),
            RawRelativePathSetting::Selectors(selectors) => Self::Selectors(selectors),
            RawRelativePathSetting::Other(_) => {
                tracing::warn!(
                    "use_relative_paths is neither a boolean nor a list of selectors; \
                     rewriting every URL"
                );
                Self::Flag(false)
            }
        }
    }
}

impl<'de> Deserialize<'de> for RelativePathSetting {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        RawRelativePathSetting::deserialize(deserializer).map(Self::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Holder {
        use_relative_paths: RelativePathSetting,
    }

    fn parse(value: &str) -> RelativePathSetting {
        let src = format!("use_relative_paths = {value}");
        toml::from_str::<Holder>(&src)
            .expect("parse holder")
            .use_relative_paths
    }

    #[test]
    fn spec_accepts_common_path_forms() {
        for path in ["/about/staff", "about/staff/", "news/?page=2#top"] {
            let spec = RemoteContentSpec::new(path).expect("valid path");
            assert_eq!(spec.remote_path, path);
        }
    }

    #[test]
    fn spec_rejects_blank_path() {
        let err = RemoteContentSpec::new("   ").unwrap_err();
        assert!(err.to_string().contains("required"));
    }

    #[test]
    fn spec_rejects_overlong_path() {
        let path = "a/".repeat(200);
        let err = RemoteContentSpec::new(path).unwrap_err();
        assert!(err.to_string().contains("max 255"));
    }

    #[test]
    fn deserialized_spec_is_validated() {
        let spec: RemoteContentSpec =
            toml::from_str(r#"remote_path = "news/latest-news/""#).expect("valid spec");
        assert_eq!(spec.remote_path, "news/latest-news/");

        let err = toml::from_str::<RemoteContentSpec>(r#"remote_path = "  ""#).unwrap_err();
        assert!(err.to_string().contains("required"));

        let long = format!("remote_path = \"{}\"", "a".repeat(256));
        assert!(toml::from_str::<RemoteContentSpec>(&long).is_err());
    }

    #[test]
    fn setting_parses_flag() {
        assert_eq!(parse("true"), RelativePathSetting::Flag(true));
        assert_eq!(parse("false"), RelativePathSetting::Flag(false));
    }

    #[test]
    fn setting_parses_selector_list_in_order() {
        let setting = parse(r#"["img.local-asset", "[data-keep-relative]"]"#);
        assert_eq!(
            setting,
            RelativePathSetting::Selectors(vec![
                "img.local-asset".into(),
                "[data-keep-relative]".into(),
            ])
        );
    }

    #[test]
    fn misconfigured_setting_never_keeps_relative() {
        assert_eq!(parse("42"), RelativePathSetting::Flag(false));
        assert_eq!(parse(r#""img""#), RelativePathSetting::Flag(false));
        assert_eq!(parse(r#"[1, "a"]"#), RelativePathSetting::Flag(false));
    }
}
