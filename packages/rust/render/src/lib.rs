//! Page rendering: turning a diagram URL into markup.
//!
//! The extraction pipeline is generic over [`Renderer`]; [`HttpRenderer`]
//! is the built-in implementation and fetches the served markup with
//! `reqwest`.

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

use topictree_shared::{Result, TopicTreeError};

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 5;

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Maximum response size we accept (25 MB).
const MAX_RESPONSE_SIZE: u64 = 25 * 1024 * 1024;

/// User-Agent string for render requests.
const USER_AGENT: &str = concat!("TopicTree/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Produces the markup of a page.
///
/// Implementations own whatever resources rendering needs and must release
/// them before the returned future completes, on success and on error.
pub trait Renderer: Send + Sync {
    /// Render `url` into a markup document.
    fn render(&self, url: &Url) -> impl Future<Output = Result<String>> + Send;
}

// ---------------------------------------------------------------------------
// HttpRenderer
// ---------------------------------------------------------------------------

/// Fetches page markup over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpRenderer {
    client: Client,
}

impl HttpRenderer {
    /// Create a renderer with the default request timeout.
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create a renderer whose requests give up after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(timeout)
            .build()
            .map_err(|e| TopicTreeError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl Renderer for HttpRenderer {
    #[instrument(skip_all, fields(url = %url))]
    async fn render(&self, url: &Url) -> Result<String> {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(TopicTreeError::validation(format!(
                "unsupported URL scheme '{}': {url}",
                url.scheme()
            )));
        }

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| TopicTreeError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TopicTreeError::Network(format!("{url}: HTTP {status}")));
        }

        if let Some(len) = response.content_length() {
            if len > MAX_RESPONSE_SIZE {
                return Err(TopicTreeError::validation(format!(
                    "{url}: response too large ({len} bytes, max {MAX_RESPONSE_SIZE})"
                )));
            }
        }

        let body = response
            .text()
            .await
            .map_err(|e| TopicTreeError::Network(format!("{url}: failed to read body: {e}")))?;

        debug!(bytes = body.len(), "page rendered");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn renders_page_body() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/map"))
            .respond_with(
                wiremock::ResponseTemplate::new(200).set_body_string("<html><svg></svg></html>"),
            )
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/map", server.uri())).unwrap();
        let body = HttpRenderer::new().unwrap().render(&url).await.unwrap();
        assert_eq!(body, "<html><svg></svg></html>");
    }

    #[tokio::test]
    async fn non_success_status_is_network_error() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::path("/missing"))
            .respond_with(wiremock::ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/missing", server.uri())).unwrap();
        let err = HttpRenderer::new().unwrap().render(&url).await.unwrap_err();
        assert!(matches!(err, TopicTreeError::Network(_)));
        assert!(err.to_string().contains("404"));
    }

    #[tokio::test]
    async fn slow_response_hits_client_timeout() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::path("/slow"))
            .respond_with(
                wiremock::ResponseTemplate::new(200)
                    .set_body_string("<html></html>")
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/slow", server.uri())).unwrap();
        let renderer = HttpRenderer::with_timeout(Duration::from_millis(100)).unwrap();
        let err = renderer.render(&url).await.unwrap_err();
        assert!(matches!(err, TopicTreeError::Network(_)));
    }

    #[tokio::test]
    async fn rejects_non_http_scheme() {
        let url = Url::parse("file:///etc/passwd").unwrap();
        let err = HttpRenderer::new().unwrap().render(&url).await.unwrap_err();
        assert!(err.to_string().contains("unsupported URL scheme"));
    }
}
