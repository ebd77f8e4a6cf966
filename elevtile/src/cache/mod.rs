//! Tile caches.
//!
//! A cache memoizes decoded tiles keyed by the coordinate's canonical
//! `{z}/{x}/{y}` string. The stored entry is a shared future, inserted
//! *before* the underlying work completes: concurrent requests for the same
//! coordinate observe and await the one in-flight load instead of issuing a
//! second fetch or decode. Entries are never evicted by this layer;
//! [`TileCache::delete`] is the only removal path.
//!
//! Two implementations are provided:
//! - [`MemoryTileCache`]: fetch-and-decode into an in-memory map
//! - [`FileTileCache`]: composes the memory cache with a durable per-tile
//!   file store, nested by zoom/x directory segments

mod file;
mod memory;

pub use file::FileTileCache;
pub use memory::MemoryTileCache;

use std::sync::Arc;

use futures::future::{BoxFuture, Shared};
use thiserror::Error;

use crate::coord::TileCoord;
use crate::source::{SourceError, TileSource};
use crate::tile::ElevationTile;

/// Outcome of one tile load.
pub type TileResult = Result<Arc<ElevationTile>, CacheError>;

/// A pending-or-resolved cache entry. Cloneable and awaitable by any number
/// of interested samplers.
pub type SharedTileFuture = Shared<BoxFuture<'static, TileResult>>;

/// Errors surfaced through a cache entry.
///
/// `Clone` because the same terminal error is observed by every awaiter of
/// the shared entry.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    /// The underlying source failed permanently for this tile.
    #[error("failed to fetch tile {coord}: {error}")]
    Fetch {
        coord: TileCoord,
        error: Arc<SourceError>,
    },

    /// Fetched bytes could not be decoded. Fatal for this tile load.
    #[error("failed to decode tile {coord}: {message}")]
    Decode { coord: TileCoord, message: String },

    /// The coordinate has no entry (never loaded, or deleted mid-flight).
    #[error("tile {coord} is not resident in the cache")]
    Missing { coord: TileCoord },

    /// The load task was cancelled or panicked before producing a tile.
    #[error("tile load task for {coord} was cancelled: {message}")]
    Cancelled { coord: TileCoord, message: String },
}

/// Memoizes decoded tiles keyed by coordinate.
///
/// All implementations guarantee at most one fetch and one decode in flight
/// per coordinate per cache instance.
pub trait TileCache: Send + Sync {
    /// Whether an entry (pending or resolved) exists for the coordinate.
    fn has(&self, coord: &TileCoord) -> bool;

    /// Ensure an entry exists for the coordinate, starting the load eagerly
    /// if there is none. A no-op while an entry is present.
    ///
    /// The load runs as a spawned task; callers must be inside a tokio
    /// runtime.
    fn load(&self, coord: TileCoord, source: &Arc<TileSource>);

    /// The stored entry, still in flight or resolved. `None` if the
    /// coordinate was never loaded.
    fn get(&self, coord: &TileCoord) -> Option<SharedTileFuture>;

    /// Remove the entry, forcing the next load to repeat the full
    /// fetch/persist/decode. Returns whether an entry existed.
    fn delete(&self, coord: &TileCoord) -> bool;
}

/// Decode fetched bytes and attach the originating coordinate.
fn decode_bytes(bytes: &[u8], coord: TileCoord) -> TileResult {
    crate::tile::decode(bytes, coord)
        .map(Arc::new)
        .map_err(|e| CacheError::Decode {
            coord,
            message: e.to_string(),
        })
}
