//! Coordinate conversion module
//!
//! Provides conversions between geographic coordinates (longitude/latitude)
//! and Web Mercator tile coordinates in the standard slippy-map pyramid
//! used by terrain tile providers.

mod types;

pub use types::{FractionalTileCoord, Point, TileCoord};

use std::f64::consts::PI;

/// Converts a geographic point to fractional tile coordinates.
///
/// Applies the Web Mercator forward projection. The x component is wrapped
/// into `[0, 2^zoom)` so any longitude (including values outside
/// `[-180, 180]`) lands on the tile grid; the y component is left unclamped.
///
/// Inputs are not validated: a latitude of exactly ±90 produces a
/// non-finite y component.
///
/// # Arguments
///
/// * `point` - Geographic point (longitude/latitude in degrees)
/// * `zoom` - Zoom level
#[inline]
pub fn point_to_tile_fraction(point: Point, zoom: u8) -> FractionalTileCoord {
    let sin = (point.lat * PI / 180.0).sin();
    let z2 = 2.0_f64.powi(zoom as i32);

    let mut x = z2 * (point.lon / 360.0 + 0.5);
    let y = z2 * (0.5 - 0.25 * ((1.0 + sin) / (1.0 - sin)).ln() / PI);

    // Wrap tile x
    x %= z2;
    if x < 0.0 {
        x += z2;
    }

    FractionalTileCoord { zoom, x, y }
}

/// Converts a geographic point to the integer tile containing it.
///
/// Floors both fractional components of [`point_to_tile_fraction`].
/// Pure and deterministic.
#[inline]
pub fn point_to_tile(point: Point, zoom: u8) -> TileCoord {
    point_to_tile_fraction(point, zoom).floor()
}

/// Converts a tile coordinate back to the geographic point at its
/// northwest corner.
#[inline]
pub fn tile_origin(tile: TileCoord) -> Point {
    let z2 = 2.0_f64.powi(tile.zoom as i32);

    let lon = tile.x as f64 / z2 * 360.0 - 180.0;

    let y = tile.y as f64 / z2;
    let lat = (PI * (1.0 - 2.0 * y)).sinh().atan() * 180.0 / PI;

    Point { lon, lat }
}
