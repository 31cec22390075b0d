//! Fetch collaborator: a single GET per render, no retries, no caching.
//!
//! The renderer only depends on the [`Fetcher`] trait; [`HttpFetcher`] is the
//! `reqwest` implementation used in production.

use std::future::Future;
use std::time::Duration;

use remotecontent_shared::{HttpConfig, RemoteContentError, Result};
use reqwest::Client;
use tracing::{debug, instrument};

/// Maximum response size we accept (10 MB).
const MAX_RESPONSE_SIZE: u64 = 10 * 1024 * 1024;

/// User-Agent string for fetch requests.
const USER_AGENT: &str = concat!("remotecontent/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Fetcher
// ---------------------------------------------------------------------------

/// Status and body of one completed GET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body; empty for non-success statuses.
    pub body: String,
}

impl FetchResponse {
    /// Only a 200 counts as success.
    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

/// Performs the GET for a resolved fetch URL.
///
/// Transport-level failures are `Err`; any completed response, whatever its
/// status, is `Ok`.
pub trait Fetcher: Send + Sync {
    fn get(&self, url: &str) -> impl Future<Output = Result<FetchResponse>> + Send;
}

// ---------------------------------------------------------------------------
// HttpFetcher
// ---------------------------------------------------------------------------

/// Configuration for the HTTP client.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Timeout for HTTP requests in seconds.
    pub timeout_secs: u64,
    /// Maximum redirects followed.
    pub max_redirects: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self::from(&HttpConfig::default())
    }
}

impl From<&HttpConfig> for FetchOptions {
    fn from(config: &HttpConfig) -> Self {
        Self {
            timeout_secs: config.timeout_secs,
            max_redirects: config.max_redirects,
        }
    }
}

/// [`Fetcher`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Build the client once; it is reused for every fetch.
    pub fn new(opts: &FetchOptions) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(opts.max_redirects))
            .timeout(Duration::from_secs(opts.timeout_secs))
            .build()
            .map_err(|e| {
                RemoteContentError::Network(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    #[instrument(skip(self))]
    async fn get(&self, url: &str) -> Result<FetchResponse> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| RemoteContentError::network(url, e))?;

        let status = response.status().as_u16();
        if status != 200 {
            debug!(status, "non-success response, discarding body");
            return Ok(FetchResponse {
                status,
                body: String::new(),
            });
        }

        if let Some(len) = response.content_length() {
            if len > MAX_RESPONSE_SIZE {
                return Err(RemoteContentError::validation(format!(
                    "{url}: response too large ({len} bytes, max {MAX_RESPONSE_SIZE})"
                )));
            }
        }

        let body = response
            .text()
            .await
            .map_err(|e| RemoteContentError::network(url, format!("failed to read body: {e}")))?;

        debug!(status, bytes = body.len(), "fetched remote content");
        Ok(FetchResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(&FetchOptions::default()).expect("build client")
    }

    #[tokio::test]
    async fn fetch_success_returns_body() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/about"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<div>Test Content</div>"))
            .expect(1)
            .mount(&server)
            .await;

        let response = fetcher().get(&format!("{}/about", server.uri())).await.unwrap();

        assert!(response.is_success());
        assert_eq!(response.body, "<div>Test Content</div>");
    }

    #[tokio::test]
    async fn fetch_not_found_is_a_response_without_body() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/nonexistent"))
            .respond_with(ResponseTemplate::new(404).set_body_string("missing"))
            .expect(1)
            .mount(&server)
            .await;

        let response = fetcher()
            .get(&format!("{}/nonexistent", server.uri()))
            .await
            .unwrap();

        assert_eq!(response.status, 404);
        assert!(!response.is_success());
        assert!(response.body.is_empty());
    }

    #[tokio::test]
    async fn other_success_codes_are_not_success() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let response = fetcher().get(&server.uri()).await.unwrap();
        assert_eq!(response.status, 204);
        assert!(!response.is_success());
    }

    #[tokio::test]
    async fn query_string_reaches_origin() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/news/"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<p>page 2</p>"))
            .expect(1)
            .mount(&server)
            .await;

        let response = fetcher()
            .get(&format!("{}/news/?page=2", server.uri()))
            .await
            .unwrap();
        assert_eq!(response.body, "<p>page 2</p>");
    }

    #[tokio::test]
    async fn unsupported_scheme_is_network_error() {
        let err = fetcher().get("ftp://example.com/about").await.unwrap_err();
        assert!(matches!(err, RemoteContentError::Network(_)));
    }

    #[tokio::test]
    async fn invalid_url_is_network_error() {
        let err = fetcher().get("not a url/about").await.unwrap_err();
        assert!(matches!(err, RemoteContentError::Network(_)));
    }
}
