//! Elevtile - elevation lookup from remote terrain tiles
//!
//! This library resolves a geographic point plus a zoom level to an
//! elevation in meters by fetching raster elevation tiles from a remote
//! provider, decoding them, and interpolating pixel values.
//!
//! # Architecture
//!
//! - [`coord`] - pure Web Mercator tile arithmetic
//! - [`source`] - tile fetching from one configured provider, bounded by a
//!   concurrency limiter and a retry budget
//! - [`tile`] - decoded rasters and the bytes-to-pixels decode step
//! - [`cache`] - coordinate-keyed memoization of decoded tiles, in memory
//!   or backed by per-tile files
//! - [`factory`] - the elevation query surface: nearest/bilinear sampling
//!   with cross-tile edge handling and bulk preloading
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use elevtile::{
//!     ElevationFactory, MemoryTileCache, Point, ReqwestClient, SourceOptions,
//!     TileSource,
//! };
//!
//! # async fn run() {
//! let client = Arc::new(ReqwestClient::new().unwrap());
//! let source = Arc::new(TileSource::aws(client, SourceOptions::default()));
//! let factory = ElevationFactory::new(source, Arc::new(MemoryTileCache::new()));
//!
//! let elevation = factory.get_z(Point::new(-17.8652, 28.7522), 11).await;
//! println!("{elevation:.1} m");
//! # }
//! ```

pub mod cache;
pub mod coord;
pub mod factory;
pub mod source;
pub mod tile;

pub use cache::{CacheError, FileTileCache, MemoryTileCache, SharedTileFuture, TileCache};
pub use coord::{
    point_to_tile, point_to_tile_fraction, tile_origin, FractionalTileCoord, Point, TileCoord,
};
pub use factory::{ElevationFactory, SampleError, SampleMethod};
pub use source::{
    AsyncHttpClient, HttpError, ReqwestClient, SourceError, SourceOptions, SourceSpecs, TileSource,
};
pub use tile::{decode, DecodeError, ElevationTile};
