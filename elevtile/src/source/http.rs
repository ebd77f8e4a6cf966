//! HTTP client abstraction for testability

use futures::future::BoxFuture;
use thiserror::Error;

/// A single failed HTTP exchange.
///
/// Non-2xx responses are reported distinctly from transport-level failures
/// so callers can tell a live-but-refusing server from an unreachable one.
/// Both are transient from the tile source's point of view and subject to
/// its retry loop.
#[derive(Debug, Clone, Error)]
pub enum HttpError {
    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// The request never produced a usable response.
    #[error("transport error for {url}: {message}")]
    Transport { url: String, message: String },
}

/// Trait for asynchronous HTTP GET operations.
///
/// This abstraction allows for dependency injection and easier testing by
/// enabling mock HTTP clients in tests. The boxed-future signature keeps the
/// trait object-safe (`Arc<dyn AsyncHttpClient>`).
pub trait AsyncHttpClient: Send + Sync {
    /// Performs an HTTP GET request, following redirects, and returns the
    /// response body as bytes.
    fn get(&self, url: &str) -> BoxFuture<'static, Result<Vec<u8>, HttpError>>;
}

/// Real HTTP client implementation using reqwest.
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Creates a new client with default configuration.
    ///
    /// Redirects are followed; there is no per-request deadline beyond
    /// reqwest's defaults, matching the no-cancellation contract of the
    /// tile source layer.
    pub fn new() -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| HttpError::Transport {
                url: String::new(),
                message: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self { client })
    }
}

impl AsyncHttpClient for ReqwestClient {
    fn get(&self, url: &str) -> BoxFuture<'static, Result<Vec<u8>, HttpError>> {
        let client = self.client.clone();
        let url = url.to_owned();

        Box::pin(async move {
            let response =
                client
                    .get(&url)
                    .send()
                    .await
                    .map_err(|e| HttpError::Transport {
                        url: url.clone(),
                        message: e.to_string(),
                    })?;

            let status = response.status();
            if !status.is_success() {
                return Err(HttpError::Status {
                    status: status.as_u16(),
                    url,
                });
            }

            response
                .bytes()
                .await
                .map(|b| b.to_vec())
                .map_err(|e| HttpError::Transport {
                    url,
                    message: format!("failed to read response body: {}", e),
                })
        })
    }
}
