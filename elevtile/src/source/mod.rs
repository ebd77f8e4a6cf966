//! Remote tile source abstraction
//!
//! A [`TileSource`] fetches raw tile bytes for a coordinate from one
//! configured provider, bounded by a per-source concurrency limiter and a
//! bounded retry loop. The four built-in providers differ only in
//! configuration (URL template, elevation decoding formula, zoom ceiling,
//! native tile width, API key requirement); there is a single source type.

mod http;
mod providers;

pub use http::{AsyncHttpClient, HttpError, ReqwestClient};

#[cfg(test)]
pub use http::tests::MockHttpClient;

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::debug;

use crate::coord::TileCoord;

/// Function producing the request URL for a tile coordinate.
pub type UrlFn = Arc<dyn Fn(&TileCoord) -> String + Send + Sync>;

/// Function decoding one pixel's red/green/blue bytes to meters.
pub type ElevFn = Arc<dyn Fn(u8, u8, u8) -> f64 + Send + Sync>;

/// Errors raised by a tile source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The provider requires an API key and none was supplied.
    #[error("{provider} source requires an API key")]
    MissingApiKey { provider: &'static str },

    /// The requested zoom exceeds what the provider serves. Raised before
    /// any network activity.
    #[error("tile {coord} out of bounds (max zoom: {max_zoom})")]
    ZoomOutOfBounds { coord: TileCoord, max_zoom: u8 },

    /// Every attempt for this tile failed.
    #[error("retries exhausted for {coord}: {last_error}")]
    RetriesExhausted {
        coord: TileCoord,
        #[source]
        last_error: HttpError,
    },
}

/// Provider capability constants, fixed at source construction.
#[derive(Debug, Clone, Copy)]
pub struct SourceSpecs {
    /// Highest zoom level the provider serves.
    pub max_zoom: u8,
    /// Native pixel width of the provider's tiles.
    pub tile_width: u32,
}

/// Tunables shared by every provider.
#[derive(Clone)]
pub struct SourceOptions {
    /// Maximum simultaneous in-flight fetches for this source.
    pub concurrency: usize,
    /// Retries after the initial attempt before a fetch fails permanently.
    pub num_retries: u32,
    /// Provider API key, where one is required.
    pub api_key: Option<String>,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            concurrency: 4,
            num_retries: 4,
            api_key: None,
        }
    }
}

/// A remote elevation tile provider.
///
/// Construct one via the built-in provider constructors ([`TileSource::aws`],
/// [`TileSource::nasadem`], [`TileSource::maptiler`], [`TileSource::mapbox`])
/// or [`TileSource::custom`] for any other terrain-RGB endpoint.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use elevtile::source::{ReqwestClient, SourceOptions, TileSource};
///
/// let client = Arc::new(ReqwestClient::new().unwrap());
/// let source = TileSource::aws(client, SourceOptions::default());
/// ```
pub struct TileSource {
    client: Arc<dyn AsyncHttpClient>,
    url_fn: UrlFn,
    elev_fn: ElevFn,
    specs: SourceSpecs,
    num_retries: u32,
    limiter: Arc<Semaphore>,
}

impl std::fmt::Debug for TileSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileSource")
            .field("specs", &self.specs)
            .field("num_retries", &self.num_retries)
            .finish_non_exhaustive()
    }
}

impl TileSource {
    /// Creates a source from a custom URL and elevation-decoding function
    /// pair.
    ///
    /// # Arguments
    ///
    /// * `client` - HTTP client used for tile fetches
    /// * `url_fn` - Builds the request URL for a tile coordinate
    /// * `elev_fn` - Decodes one pixel's RGB bytes to meters
    /// * `specs` - Provider capability constants
    /// * `options` - Concurrency and retry tunables
    pub fn custom(
        client: Arc<dyn AsyncHttpClient>,
        url_fn: UrlFn,
        elev_fn: ElevFn,
        specs: SourceSpecs,
        options: SourceOptions,
    ) -> Self {
        Self {
            client,
            url_fn,
            elev_fn,
            specs,
            num_retries: options.num_retries,
            limiter: Arc::new(Semaphore::new(options.concurrency.max(1))),
        }
    }

    /// Fetch raw tile bytes using the configured retry budget.
    ///
    /// # Errors
    ///
    /// * [`SourceError::ZoomOutOfBounds`] if the coordinate's zoom exceeds
    ///   the provider's ceiling; no network attempt is made.
    /// * [`SourceError::RetriesExhausted`] once every attempt has failed;
    ///   the error names the coordinate.
    pub async fn get(&self, coord: TileCoord) -> Result<Vec<u8>, SourceError> {
        self.get_with_retries(coord, self.num_retries).await
    }

    /// Fetch raw tile bytes with an explicit retry budget.
    ///
    /// Runs up to `num_retries + 1` attempts. Each attempt acquires its own
    /// permit from the source's FIFO concurrency limiter, so a retry
    /// re-enters the admission queue behind already-waiting fetches rather
    /// than holding its slot. Failed attempts are resubmitted immediately,
    /// with no backoff.
    pub async fn get_with_retries(
        &self,
        coord: TileCoord,
        num_retries: u32,
    ) -> Result<Vec<u8>, SourceError> {
        if coord.zoom > self.specs.max_zoom {
            return Err(SourceError::ZoomOutOfBounds {
                coord,
                max_zoom: self.specs.max_zoom,
            });
        }

        let url = (self.url_fn)(&coord);
        let mut attempts_remaining = num_retries + 1;

        loop {
            let _permit = self
                .limiter
                .acquire()
                .await
                .expect("tile source limiter closed");

            match self.client.get(&url).await {
                Ok(bytes) => return Ok(bytes),
                Err(err) => {
                    attempts_remaining -= 1;
                    if attempts_remaining == 0 {
                        return Err(SourceError::RetriesExhausted {
                            coord,
                            last_error: err,
                        });
                    }
                    debug!(%coord, error = %err, attempts_remaining, "tile fetch failed, retrying");
                }
            }
        }
    }

    /// The request URL for a tile coordinate.
    pub fn url(&self, coord: &TileCoord) -> String {
        (self.url_fn)(coord)
    }

    /// Decode one pixel's RGB bytes to an elevation in meters using the
    /// provider's formula.
    pub fn elevation(&self, r: u8, g: u8, b: u8) -> f64 {
        (self.elev_fn)(r, g, b)
    }

    /// Highest zoom level this source serves.
    pub fn max_zoom(&self) -> u8 {
        self.specs.max_zoom
    }

    /// Native pixel width of this source's tiles.
    pub fn tile_width(&self) -> u32 {
        self.specs.tile_width
    }

    /// Retries after the initial attempt before a fetch fails permanently.
    pub fn num_retries(&self) -> u32 {
        self.num_retries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::BoxFuture;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn test_source(client: Arc<dyn AsyncHttpClient>, options: SourceOptions) -> TileSource {
        TileSource::custom(
            client,
            Arc::new(|coord: &TileCoord| format!("http://tiles.test/{}.png", coord)),
            Arc::new(|r, _, _| r as f64),
            SourceSpecs {
                max_zoom: 14,
                tile_width: 256,
            },
            options,
        )
    }

    #[tokio::test]
    async fn test_get_returns_bytes() {
        let client = Arc::new(MockHttpClient::ok(vec![9, 8, 7]));
        let source = test_source(client.clone(), SourceOptions::default());

        let bytes = source.get(TileCoord::new(10, 1, 2)).await.unwrap();
        assert_eq!(bytes, vec![9, 8, 7]);
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn test_zoom_out_of_bounds_makes_no_request() {
        let client = Arc::new(MockHttpClient::ok(vec![1]));
        let source = test_source(client.clone(), SourceOptions::default());

        let result = source.get(TileCoord::new(15, 0, 0)).await;
        assert!(matches!(
            result,
            Err(SourceError::ZoomOutOfBounds { max_zoom: 14, .. })
        ));
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_retries_run_exactly_n_plus_one_attempts() {
        let client = Arc::new(MockHttpClient::failing(500));
        let source = test_source(
            client.clone(),
            SourceOptions {
                num_retries: 3,
                ..Default::default()
            },
        );

        let coord = TileCoord::new(10, 4, 5);
        let result = source.get(coord).await;

        assert_eq!(client.call_count(), 4);
        match result {
            Err(SourceError::RetriesExhausted { coord: c, .. }) => assert_eq!(c, coord),
            other => panic!("expected RetriesExhausted, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_exhausted_error_names_the_coordinate() {
        let client = Arc::new(MockHttpClient::failing(404));
        let source = test_source(
            client,
            SourceOptions {
                num_retries: 0,
                ..Default::default()
            },
        );

        let err = source.get(TileCoord::new(10, 123, 456)).await.unwrap_err();
        assert!(err.to_string().contains("10/123/456"));
    }

    #[tokio::test]
    async fn test_zero_retries_attempts_once() {
        let client = Arc::new(MockHttpClient::failing(500));
        let source = test_source(
            client.clone(),
            SourceOptions {
                num_retries: 0,
                ..Default::default()
            },
        );

        let _ = source.get(TileCoord::new(10, 0, 0)).await;
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn test_explicit_retry_budget_overrides_default() {
        let client = Arc::new(MockHttpClient::failing(500));
        let source = test_source(
            client.clone(),
            SourceOptions {
                num_retries: 4,
                ..Default::default()
            },
        );

        let _ = source
            .get_with_retries(TileCoord::new(10, 0, 0), 1)
            .await;
        assert_eq!(client.call_count(), 2);
    }

    /// Client that records the peak number of simultaneous requests.
    struct ConcurrencyProbe {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl ConcurrencyProbe {
        fn new() -> Self {
            Self {
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }
    }

    #[tokio::test]
    async fn test_limiter_bounds_in_flight_fetches() {
        let probe = Arc::new(ConcurrencyProbe::new());

        struct ProbeClient(Arc<ConcurrencyProbe>);
        impl AsyncHttpClient for ProbeClient {
            fn get(&self, _url: &str) -> BoxFuture<'static, Result<Vec<u8>, HttpError>> {
                let probe = Arc::clone(&self.0);
                Box::pin(async move {
                    let current = probe.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    probe.peak.fetch_max(current, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    probe.in_flight.fetch_sub(1, Ordering::SeqCst);
                    Ok(vec![0])
                })
            }
        }

        let source = Arc::new(test_source(
            Arc::new(ProbeClient(Arc::clone(&probe))),
            SourceOptions {
                concurrency: 2,
                ..Default::default()
            },
        ));

        let mut handles = Vec::new();
        for x in 0..8 {
            let source = Arc::clone(&source);
            handles.push(tokio::spawn(async move {
                source.get(TileCoord::new(10, x, 0)).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert!(
            probe.peak.load(Ordering::SeqCst) <= 2,
            "peak in-flight {} exceeded the configured limit",
            probe.peak.load(Ordering::SeqCst)
        );
    }
}
