//! Elevation queries.
//!
//! [`ElevationFactory`] translates a geographic query into an elevation
//! value: it owns the point-to-pixel arithmetic, the cross-tile edge
//! handling, and the nearest/bilinear samplers, delegating tile residency
//! to its cache and raw bytes to its source.
//!
//! Sampling degrades rather than aborts: any failure while resolving pixels
//! (unreachable neighbor, decode failure, exhausted retries) turns into a
//! `NaN` elevation. Only [`ElevationFactory::get_tile`] propagates errors to
//! the caller.

use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::cache::{CacheError, SharedTileFuture, TileCache};
use crate::coord::{point_to_tile, point_to_tile_fraction, Point, TileCoord};
use crate::source::TileSource;
use crate::tile::ElevationTile;

/// How an elevation query samples the decoded raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleMethod {
    /// The single pixel containing the point.
    Nearest,
    /// Weighted average of the four pixels around the point.
    #[default]
    Bilinear,
}

impl FromStr for SampleMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nearest" => Ok(Self::Nearest),
            "bilinear" => Ok(Self::Bilinear),
            other => Err(format!("unknown sample method: {}", other)),
        }
    }
}

/// Failure while sampling a tile. Callers of `get_z` never see these; they
/// surface as `NaN`.
#[derive(Debug, Error)]
pub enum SampleError {
    /// A required tile (the queried one or a neighbor) could not be loaded.
    #[error(transparent)]
    Tile(#[from] CacheError),

    /// The candidate pixel matched none of the eight edge cases.
    #[error("pixel ({px}, {py}) in tile {coord} could not be classified")]
    UnresolvedPixel { coord: TileCoord, px: i64, py: i64 },

    /// The resolved pixel offset fell outside the decoded buffer.
    #[error("pixel ({px}, {py}) is outside the decoded buffer of tile {coord}")]
    BufferOverrun { coord: TileCoord, px: i64, py: i64 },
}

/// Answers "elevation at point P, zoom Z" against one source and one cache.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use elevtile::{
///     cache::MemoryTileCache,
///     factory::ElevationFactory,
///     coord::Point,
///     source::{ReqwestClient, SourceOptions, TileSource},
/// };
///
/// # async fn run() {
/// let client = Arc::new(ReqwestClient::new().unwrap());
/// let source = Arc::new(TileSource::aws(client, SourceOptions::default()));
/// let factory = ElevationFactory::new(source, Arc::new(MemoryTileCache::new()));
///
/// let elevation = factory.get_z(Point::new(-17.865, 28.752), 11).await;
/// # let _ = elevation;
/// # }
/// ```
pub struct ElevationFactory {
    source: Arc<TileSource>,
    cache: Arc<dyn TileCache>,
    default_method: SampleMethod,
}

impl ElevationFactory {
    /// Create a factory over a source and a cache.
    pub fn new(source: Arc<TileSource>, cache: Arc<dyn TileCache>) -> Self {
        Self {
            source,
            cache,
            default_method: SampleMethod::default(),
        }
    }

    /// Replace the default sample method used by [`ElevationFactory::get_z`].
    pub fn with_default_method(mut self, method: SampleMethod) -> Self {
        self.default_method = method;
        self
    }

    /// Elevation in meters at `point`, sampled with the factory's default
    /// method. `NaN` when the elevation is unavailable.
    pub async fn get_z(&self, point: Point, zoom: u8) -> f64 {
        self.get_z_with(point, zoom, self.default_method).await
    }

    /// Elevation in meters at `point` with an explicit sample method.
    ///
    /// Any failure along the way (fetch, decode, pixel resolution) yields
    /// `NaN` rather than an error; treat `NaN` as "elevation unavailable".
    pub async fn get_z_with(&self, point: Point, zoom: u8, method: SampleMethod) -> f64 {
        match self.sample(point, zoom, method).await {
            Ok(elevation) => elevation,
            Err(err) => {
                debug!(
                    lon = point.lon,
                    lat = point.lat,
                    zoom,
                    error = %err,
                    "sampling degraded to NaN"
                );
                f64::NAN
            }
        }
    }

    /// Ensure the tile for `coord` is resident and return it.
    ///
    /// Unlike `get_z`, failures propagate. This is the entry point reused
    /// for neighbor lookups during edge handling and for preloading.
    pub async fn get_tile(&self, coord: TileCoord) -> Result<Arc<ElevationTile>, CacheError> {
        if !self.cache.has(&coord) {
            self.cache.load(coord, &self.source);
        }

        match self.cache.get(&coord) {
            Some(entry) => entry.await,
            None => Err(CacheError::Missing { coord }),
        }
    }

    /// Start loading every tile covering the box spanned by two corner
    /// points, for each zoom level in `min_zoom..=max_zoom`.
    ///
    /// The corners may be given in either order. Returns the pending loads
    /// for the caller to await collectively; tiles already resident (or
    /// requested twice by overlapping boxes) are not fetched again, by the
    /// cache's per-coordinate guarantee.
    pub fn pre_load_bbox(
        &self,
        corner_a: Point,
        corner_b: Point,
        min_zoom: u8,
        max_zoom: u8,
    ) -> Vec<SharedTileFuture> {
        let mut pending = Vec::new();

        for zoom in min_zoom..=max_zoom {
            let a = point_to_tile(corner_a, zoom);
            let b = point_to_tile(corner_b, zoom);

            let (x_start, x_end) = (a.x.min(b.x), a.x.max(b.x));
            let (y_start, y_end) = (a.y.min(b.y), a.y.max(b.y));

            for x in x_start..=x_end {
                for y in y_start..=y_end {
                    let coord = TileCoord::new(zoom, x, y);
                    if !self.cache.has(&coord) {
                        self.cache.load(coord, &self.source);
                    }
                    if let Some(entry) = self.cache.get(&coord) {
                        pending.push(entry);
                    }
                }
            }
        }

        pending
    }

    async fn sample(
        &self,
        point: Point,
        zoom: u8,
        method: SampleMethod,
    ) -> Result<f64, SampleError> {
        let fraction = point_to_tile_fraction(point, zoom);
        let coord = fraction.floor();

        // In-tile offset, each component in [0, 1)
        let fx = fraction.x - coord.x as f64;
        let fy = fraction.y - coord.y as f64;

        let tile = self.get_tile(coord).await?;

        match method {
            SampleMethod::Nearest => self.nearest(&tile, fx, fy).await,
            SampleMethod::Bilinear => self.bilinear(&tile, fx, fy).await,
        }
    }

    async fn nearest(
        &self,
        tile: &Arc<ElevationTile>,
        fx: f64,
        fy: f64,
    ) -> Result<f64, SampleError> {
        let px = (fx * tile.width as f64).floor() as i64;
        let py = (fy * tile.height as f64).floor() as i64;

        self.pixel_elev(tile, px, py).await
    }

    /// Resolve one candidate pixel to an elevation, following overflows into
    /// the neighboring tile.
    ///
    /// A pixel outside the tile's bounds matches exactly one of eight cases:
    /// four corners (two bounds violated, checked first) and four edges. The
    /// facing neighbor is fetched and the pixel remapped to its adjacent
    /// edge or corner, using the neighbor's own dimensions.
    async fn pixel_elev(
        &self,
        tile: &Arc<ElevationTile>,
        px: i64,
        py: i64,
    ) -> Result<f64, SampleError> {
        let mut tile = Arc::clone(tile);
        let (mut px, mut py) = (px, py);

        let is_right = px > tile.width as i64 - 1;
        let is_top = py > tile.height as i64 - 1;
        let is_left = px < 0;
        let is_bottom = py < 0;

        if is_right || is_top || is_left || is_bottom {
            let coord = tile.coord;

            match (is_right, is_top, is_left, is_bottom) {
                (true, true, _, _) => {
                    tile = self.get_tile(coord.offset(1, 1)).await?;
                    px = 0;
                    py = 0;
                }
                (true, _, _, true) => {
                    tile = self.get_tile(coord.offset(1, -1)).await?;
                    px = 0;
                    py = tile.height as i64 - 1;
                }
                (_, true, true, _) => {
                    tile = self.get_tile(coord.offset(-1, 1)).await?;
                    px = tile.width as i64 - 1;
                    py = 0;
                }
                (_, _, true, true) => {
                    tile = self.get_tile(coord.offset(-1, -1)).await?;
                    px = tile.width as i64 - 1;
                    py = tile.height as i64 - 1;
                }
                (true, _, _, _) => {
                    tile = self.get_tile(coord.offset(1, 0)).await?;
                    px = 0;
                }
                (_, true, _, _) => {
                    tile = self.get_tile(coord.offset(0, 1)).await?;
                    py = 0;
                }
                (_, _, true, _) => {
                    tile = self.get_tile(coord.offset(-1, 0)).await?;
                    px = tile.width as i64 - 1;
                }
                (_, _, _, true) => {
                    tile = self.get_tile(coord.offset(0, -1)).await?;
                    py = tile.height as i64 - 1;
                }
                _ => return Err(SampleError::UnresolvedPixel { coord, px, py }),
            }
        }

        let (r, g, b) =
            tile.rgb_at(px as u32, py as u32)
                .ok_or(SampleError::BufferOverrun {
                    coord: tile.coord,
                    px,
                    py,
                })?;

        Ok(self.source.elevation(r, g, b))
    }

    async fn bilinear(
        &self,
        tile: &Arc<ElevationTile>,
        fx: f64,
        fy: f64,
    ) -> Result<f64, SampleError> {
        let x = fx * tile.width as f64;
        let y = fy * tile.height as f64;

        let px = x.floor() as i64;
        let py = y.floor() as i64;

        let x_pos = x - px as f64;
        let y_pos = y - py as f64;

        // Pick the 2x2 pixel block whose centers bracket the sample point.
        // Weights are re-centered on the block's first pixel.
        let (corners, wx, wy) = if x_pos >= 0.5 {
            if y_pos >= 0.5 {
                (
                    [(px, py), (px + 1, py), (px, py + 1), (px + 1, py + 1)],
                    x_pos - 0.5,
                    y_pos - 0.5,
                )
            } else {
                (
                    [(px, py - 1), (px + 1, py - 1), (px, py), (px + 1, py)],
                    x_pos - 0.5,
                    y_pos + 0.5,
                )
            }
        } else if y_pos >= 0.5 {
            (
                [(px - 1, py), (px, py), (px - 1, py + 1), (px, py + 1)],
                x_pos + 0.5,
                y_pos - 0.5,
            )
        } else {
            (
                [(px - 1, py - 1), (px, py - 1), (px - 1, py), (px, py)],
                x_pos + 0.5,
                y_pos + 0.5,
            )
        };

        let (f00, f10, f01, f11) = futures::try_join!(
            self.pixel_elev(tile, corners[0].0, corners[0].1),
            self.pixel_elev(tile, corners[1].0, corners[1].1),
            self.pixel_elev(tile, corners[2].0, corners[2].1),
            self.pixel_elev(tile, corners[3].0, corners[3].1),
        )?;

        Ok(blend(f00, f10, f01, f11, wx, wy))
    }
}

/// Standard bilinear combination of four corner samples.
fn blend(f00: f64, f10: f64, f01: f64, f11: f64, x: f64, y: f64) -> f64 {
    f00 * (1.0 - x) * (1.0 - y)
        + f10 * x * (1.0 - y)
        + f01 * (1.0 - x) * y
        + f11 * x * y
}
