//! Render path: resolve → fetch → rewrite → outcome.
//!
//! Every failure is absorbed here. Callers always get a [`RenderOutcome`];
//! in debug mode a failed render carries a short diagnostic string, otherwise
//! it is silently empty.

use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};
use url::{Url, form_urlencoded};

use remotecontent_fetch::Fetcher;
use remotecontent_rewrite::{KeepRelativePolicy, resolve_fetch_url, rewrite_markup_with_stats};
use remotecontent_shared::{AppConfig, RemoteContentSpec};

// ---------------------------------------------------------------------------
// Settings and request context
// ---------------------------------------------------------------------------

/// Immutable configuration snapshot handed to the renderer.
#[derive(Debug, Clone)]
pub struct RenderSettings {
    /// Origin that remote paths resolve against.
    pub root_url: String,
    /// Compiled keep-relative policy.
    pub policy: KeepRelativePolicy,
    /// Surface diagnostics instead of silently empty output.
    pub debug_mode: bool,
}

impl From<&AppConfig> for RenderSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            root_url: config.source.root_url.clone(),
            policy: KeepRelativePolicy::compile(&config.source.use_relative_paths),
            debug_mode: config.render.debug_mode,
        }
    }
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

/// The parts of an inbound host-page request the renderer cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// Query parameters in request order, percent-decoded.
    pub query: Vec<(String, String)>,
}

impl RequestContext {
    /// Parse a raw query string (`a=1&b=2`, leading `?` optional).
    pub fn from_query_string(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        Self {
            query: form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// What the host page receives for one embedding point.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenderOutcome {
    /// The URL that was fetched.
    pub source_url: String,
    /// Rewritten markup, on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markup: Option<String>,
    /// Human-readable failure, in debug mode only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_string: Option<String>,
}

impl RenderOutcome {
    pub fn is_success(&self) -> bool {
        self.markup.is_some()
    }
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// Renders remote content specs using a fetch collaborator.
pub struct Renderer<F> {
    settings: RenderSettings,
    fetcher: F,
}

impl<F: Fetcher> Renderer<F> {
    pub fn new(settings: RenderSettings, fetcher: F) -> Self {
        Self { settings, fetcher }
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// The URL `spec` would be fetched from for this request.
    pub fn source_url(&self, spec: &RemoteContentSpec, request: Option<&RequestContext>) -> String {
        resolve_fetch_url(
            &self.settings.root_url,
            &spec.remote_path,
            request.map(|r| r.query.as_slice()),
        )
    }

    /// Fetch and rewrite the content for one embedding point.
    ///
    /// The fetch is attempted exactly once. Non-200 responses, transport
    /// errors, empty bodies and unusable fetch URLs all end in the same
    /// failure outcome.
    #[instrument(skip_all, fields(remote_path = %spec.remote_path))]
    pub async fn render(
        &self,
        spec: &RemoteContentSpec,
        request: Option<&RequestContext>,
    ) -> RenderOutcome {
        let source_url = self.source_url(spec, request);
        debug!(%source_url, "attempting to fetch");

        let body = match self.fetcher.get(&source_url).await {
            Ok(response) if response.is_success() => response.body,
            Ok(response) => {
                error!(%source_url, status = response.status, "failed to fetch remote content");
                let message = format!(
                    "Failed to fetch content from {source_url} (HTTP {})",
                    response.status
                );
                return self.failure(source_url, message);
            }
            Err(e) => {
                error!(%source_url, error = %e, "failed to fetch remote content");
                let message = format!("Failed to fetch content from {source_url}");
                return self.failure(source_url, message);
            }
        };

        let base_url = match Url::parse(&source_url) {
            Ok(url) => url,
            Err(e) => {
                warn!(%source_url, error = %e, "fetch URL is not a valid base for rewriting");
                let message = format!("Invalid source URL {source_url}");
                return self.failure(source_url, message);
            }
        };

        match rewrite_markup_with_stats(&body, &base_url, &self.settings.policy) {
            Some((markup, stats)) => {
                info!(
                    %source_url,
                    bytes = markup.len(),
                    rewritten = stats.src + stats.srcset + stats.href,
                    kept_relative = stats.kept_relative,
                    "rendered remote content"
                );
                RenderOutcome {
                    source_url,
                    markup: Some(markup),
                    error_string: None,
                }
            }
            None => {
                warn!(%source_url, "remote content was empty");
                let message = format!("No content returned from {source_url}");
                self.failure(source_url, message)
            }
        }
    }

    fn failure(&self, source_url: String, message: String) -> RenderOutcome {
        RenderOutcome {
            source_url,
            markup: None,
            error_string: self.settings.debug_mode.then_some(message),
        }
    }
}
