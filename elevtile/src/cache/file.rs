//! File-backed tile cache.
//!
//! Composes the in-memory cache with a durable per-tile file store. Tiles
//! are kept as the raw fetched bytes at `{root}/{zoom}/{x}/{y}.png`, so a
//! warm directory survives process restarts and can be shared between runs.
//! Writes are not locked across processes; two processes persisting the same
//! tile race benignly (last write wins, identical bytes).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::FutureExt;
use tracing::{debug, warn};

use super::{decode_bytes, CacheError, MemoryTileCache, SharedTileFuture, TileCache, TileResult};
use crate::coord::TileCoord;
use crate::source::TileSource;

/// Tile cache backed by per-tile files under a root directory.
pub struct FileTileCache {
    memory: MemoryTileCache,
    root: PathBuf,
}

impl FileTileCache {
    /// Create a cache rooted at `root`.
    ///
    /// The directory (and per-zoom subdirectories) are created lazily on
    /// first persist.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            memory: MemoryTileCache::new(),
            root: root.into(),
        }
    }

    /// The root directory tiles are persisted under.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The on-disk location for a coordinate.
    pub fn tile_path(&self, coord: &TileCoord) -> PathBuf {
        self.root
            .join(coord.zoom.to_string())
            .join(coord.x.to_string())
            .join(format!("{}.png", coord.y))
    }
}

impl TileCache for FileTileCache {
    fn has(&self, coord: &TileCoord) -> bool {
        self.memory.has(coord)
    }

    fn load(&self, coord: TileCoord, source: &Arc<TileSource>) {
        let source = Arc::clone(source);
        let path = self.tile_path(&coord);

        self.memory.load_with(coord, move || {
            read_or_fetch(path, coord, source).boxed()
        });
    }

    fn get(&self, coord: &TileCoord) -> Option<SharedTileFuture> {
        self.memory.get(coord)
    }

    fn delete(&self, coord: &TileCoord) -> bool {
        self.memory.delete(coord)
    }
}

/// Serve a tile from disk if previously persisted, otherwise fetch it and
/// persist the raw bytes before decoding.
///
/// A persist failure is logged and otherwise ignored: the bytes are already
/// in hand, and the decoded tile must still reach the in-memory entry.
async fn read_or_fetch(
    path: PathBuf,
    coord: TileCoord,
    source: Arc<TileSource>,
) -> TileResult {
    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            debug!(%coord, path = %path.display(), "tile served from disk");
            decode_bytes(&bytes, coord)
        }
        Err(_) => {
            let bytes = source.get(coord).await.map_err(|e| CacheError::Fetch {
                coord,
                error: Arc::new(e),
            })?;

            if let Err(err) = persist(&path, &bytes).await {
                warn!(%coord, path = %path.display(), error = %err, "failed to persist tile");
            }

            decode_bytes(&bytes, coord)
        }
    }
}

async fn persist(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes).await
}
