//! Tile and point coordinate types.

use std::fmt;

/// A tile in the slippy-map pyramid.
///
/// Identifies one tile by zoom level and grid position. The axes are signed:
/// neighbor arithmetic at the pyramid edge produces coordinates outside the
/// grid, which fail at fetch time rather than silently wrapping.
///
/// The `Display` form `{z}/{x}/{y}` is the canonical cache key and the
/// path fragment used by tile URLs and the file cache.
///
/// # Example
///
/// ```
/// use elevtile::TileCoord;
///
/// let tile = TileCoord::new(12, 1844, 1706);
/// assert_eq!(tile.to_string(), "12/1844/1706");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    /// Zoom level
    pub zoom: u8,
    /// Tile column (west to east)
    pub x: i32,
    /// Tile row (north to south)
    pub y: i32,
}

impl TileCoord {
    /// Create a new tile coordinate.
    pub fn new(zoom: u8, x: i32, y: i32) -> Self {
        Self { zoom, x, y }
    }

    /// The tile displaced by `(dx, dy)` grid cells at the same zoom.
    pub fn offset(&self, dx: i32, dy: i32) -> Self {
        Self {
            zoom: self.zoom,
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

/// A geographic point: longitude and latitude in degrees.
///
/// Ranges are not validated; out-of-range longitudes wrap onto the tile
/// grid during projection and out-of-range latitudes run off it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    /// Longitude in degrees
    pub lon: f64,
    /// Latitude in degrees
    pub lat: f64,
}

impl Point {
    /// Create a new point from longitude and latitude in degrees.
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

/// Fractional tile coordinates: a position on the tile grid before
/// flooring to a tile cell.
///
/// The fractional parts of `x` and `y` are the in-tile offset used by the
/// sampling code.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FractionalTileCoord {
    /// Zoom level
    pub zoom: u8,
    /// Fractional tile column
    pub x: f64,
    /// Fractional tile row
    pub y: f64,
}

impl FractionalTileCoord {
    /// The integer tile containing this position.
    pub fn floor(&self) -> TileCoord {
        TileCoord {
            zoom: self.zoom,
            x: self.x.floor() as i32,
            y: self.y.floor() as i32,
        }
    }
}
