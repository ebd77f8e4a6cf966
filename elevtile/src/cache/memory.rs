//! In-memory tile cache.
//!
//! Entries live in a concurrent map keyed by the coordinate's canonical
//! string. The per-key entry lock of the map is the latch that guarantees at
//! most one load per coordinate: the shared future is inserted while the
//! spawned work has barely started, so every later request joins it.

use std::sync::Arc;

use dashmap::DashMap;
use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::debug;

use super::{decode_bytes, CacheError, SharedTileFuture, TileCache, TileResult};
use crate::coord::TileCoord;
use crate::source::TileSource;

/// In-memory tile cache: always fetches through the source on first load.
#[derive(Default)]
pub struct MemoryTileCache {
    entries: DashMap<String, SharedTileFuture>,
}

impl MemoryTileCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries, pending or resolved.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert an eagerly-spawned entry for `coord` unless one exists.
    ///
    /// `make_task` is only invoked when the slot is vacant, under the map's
    /// entry lock, which is what makes concurrent loads coalesce. The task
    /// runs on the tokio runtime immediately rather than waiting for the
    /// first awaiter.
    pub(crate) fn load_with<F>(&self, coord: TileCoord, make_task: F)
    where
        F: FnOnce() -> BoxFuture<'static, TileResult>,
    {
        self.entries.entry(coord.to_string()).or_insert_with(|| {
            debug!(%coord, "starting tile load");
            let handle = tokio::spawn(make_task());
            async move {
                match handle.await {
                    Ok(result) => result,
                    Err(err) => Err(CacheError::Cancelled {
                        coord,
                        message: err.to_string(),
                    }),
                }
            }
            .boxed()
            .shared()
        });
    }
}

impl TileCache for MemoryTileCache {
    fn has(&self, coord: &TileCoord) -> bool {
        self.entries.contains_key(&coord.to_string())
    }

    fn load(&self, coord: TileCoord, source: &Arc<TileSource>) {
        let source = Arc::clone(source);
        self.load_with(coord, move || {
            async move {
                let bytes = source.get(coord).await.map_err(|e| CacheError::Fetch {
                    coord,
                    error: Arc::new(e),
                })?;
                decode_bytes(&bytes, coord)
            }
            .boxed()
        });
    }

    fn get(&self, coord: &TileCoord) -> Option<SharedTileFuture> {
        self.entries
            .get(&coord.to_string())
            .map(|entry| entry.value().clone())
    }

    fn delete(&self, coord: &TileCoord) -> bool {
        self.entries.remove(&coord.to_string()).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{
        AsyncHttpClient, HttpError, MockHttpClient, SourceOptions, SourceSpecs,
    };
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn png_tile(width: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, width, |x, y| Rgb([x as u8, y as u8, 0]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn source_with_client(client: Arc<dyn AsyncHttpClient>) -> Arc<TileSource> {
        Arc::new(TileSource::custom(
            client,
            Arc::new(|coord: &TileCoord| format!("http://tiles.test/{}.png", coord)),
            Arc::new(|r, g, _| r as f64 * 256.0 + g as f64),
            SourceSpecs {
                max_zoom: 16,
                tile_width: 8,
            },
            SourceOptions::default(),
        ))
    }

    #[tokio::test]
    async fn test_load_then_get_returns_decoded_tile() {
        let cache = MemoryTileCache::new();
        let source = source_with_client(Arc::new(MockHttpClient::ok(png_tile(8))));
        let coord = TileCoord::new(10, 3, 4);

        assert!(!cache.has(&coord));
        assert!(cache.is_empty());
        cache.load(coord, &source);
        assert!(cache.has(&coord));
        assert_eq!(cache.len(), 1);

        let tile = cache.get(&coord).unwrap().await.unwrap();
        assert_eq!(tile.coord, coord);
        assert_eq!(tile.width, 8);
        assert_eq!(tile.channels, 3);
    }

    #[tokio::test]
    async fn test_get_without_load_is_absent() {
        let cache = MemoryTileCache::new();
        assert!(cache.get(&TileCoord::new(3, 1, 1)).is_none());
    }

    #[tokio::test]
    async fn test_repeat_load_fetches_once() {
        let cache = MemoryTileCache::new();
        let client = Arc::new(MockHttpClient::ok(png_tile(8)));
        let source = source_with_client(client.clone());
        let coord = TileCoord::new(10, 3, 4);

        cache.load(coord, &source);
        cache.load(coord, &source);

        cache.get(&coord).unwrap().await.unwrap();
        cache.get(&coord).unwrap().await.unwrap();

        assert_eq!(client.call_count(), 1);
    }

    /// Client that answers slowly so overlapping loads stay overlapped.
    struct SlowClient {
        bytes: Vec<u8>,
        calls: AtomicUsize,
    }

    impl AsyncHttpClient for SlowClient {
        fn get(&self, _url: &str) -> BoxFuture<'static, Result<Vec<u8>, HttpError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let bytes = self.bytes.clone();
            Box::pin(async move {
                tokio::time::sleep(Duration::from_millis(30)).await;
                Ok(bytes)
            })
        }
    }

    #[tokio::test]
    async fn test_concurrent_loads_coalesce_to_one_fetch() {
        let cache = Arc::new(MemoryTileCache::new());
        let client = Arc::new(SlowClient {
            bytes: png_tile(8),
            calls: AtomicUsize::new(0),
        });
        let source = source_with_client(client.clone());
        let coord = TileCoord::new(10, 3, 4);

        let mut handles = Vec::new();
        for _ in 0..4 {
            let cache = Arc::clone(&cache);
            let source = Arc::clone(&source);
            handles.push(tokio::spawn(async move {
                cache.load(coord, &source);
                cache.get(&coord).unwrap().await
            }));
        }

        for handle in handles {
            let tile = handle.await.unwrap().unwrap();
            assert_eq!(tile.coord, coord);
        }

        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_delete_forces_a_fresh_fetch() {
        let cache = MemoryTileCache::new();
        let client = Arc::new(MockHttpClient::ok(png_tile(8)));
        let source = source_with_client(client.clone());
        let coord = TileCoord::new(10, 3, 4);

        cache.load(coord, &source);
        cache.get(&coord).unwrap().await.unwrap();

        assert!(cache.delete(&coord));
        assert!(!cache.has(&coord));

        cache.load(coord, &source);
        cache.get(&coord).unwrap().await.unwrap();

        assert_eq!(client.call_count(), 2);
    }

    #[tokio::test]
    async fn test_delete_missing_returns_false() {
        let cache = MemoryTileCache::new();
        assert!(!cache.delete(&TileCoord::new(1, 0, 0)));
    }

    #[tokio::test]
    async fn test_fetch_failure_propagates_to_every_awaiter() {
        let cache = MemoryTileCache::new();
        let client = Arc::new(MockHttpClient::failing(500));
        let source = source_with_client(client.clone());
        let coord = TileCoord::new(10, 3, 4);

        cache.load(coord, &source);
        let entry = cache.get(&coord).unwrap();

        let first = entry.clone().await;
        let second = entry.await;

        assert!(matches!(first, Err(CacheError::Fetch { .. })));
        assert!(matches!(second, Err(CacheError::Fetch { .. })));
        // The failed load is memoized too; no refetch happened
        assert_eq!(client.call_count(), 1 + source.num_retries() as usize);
    }

    #[tokio::test]
    async fn test_malformed_bytes_surface_decode_error() {
        let cache = MemoryTileCache::new();
        let source = source_with_client(Arc::new(MockHttpClient::ok(vec![0xBA, 0xD0])));
        let coord = TileCoord::new(10, 3, 4);

        cache.load(coord, &source);
        let result = cache.get(&coord).unwrap().await;

        assert!(matches!(result, Err(CacheError::Decode { .. })));
    }
}
