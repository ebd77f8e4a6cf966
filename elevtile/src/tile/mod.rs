//! Decoded elevation tiles.
//!
//! A fetched tile arrives as PNG bytes and is decoded once into an
//! [`ElevationTile`]: a flat pixel buffer annotated with the coordinate it
//! came from, so sampling code can derive neighboring tiles. Decoding is a
//! pure function over an in-memory buffer; a decode failure is fatal for
//! that tile load.

use image::{DynamicImage, GenericImageView};
use thiserror::Error;

use crate::coord::TileCoord;

/// Error decoding fetched tile bytes into a pixel grid.
#[derive(Debug, Error)]
#[error("failed to decode tile image: {0}")]
pub struct DecodeError(#[from] image::ImageError);

/// A decoded raster elevation tile.
///
/// Immutable after creation and shared read-only (as `Arc<ElevationTile>`)
/// by every sampling call that references it. Elevation is recovered from
/// the red/green/blue channel bytes by the owning source's decoding formula.
#[derive(Debug, Clone)]
pub struct ElevationTile {
    /// The tile this raster was decoded from.
    pub coord: TileCoord,
    /// Pixel columns.
    pub width: u32,
    /// Pixel rows.
    pub height: u32,
    /// Channels per pixel (3 for RGB, 4 for RGBA).
    pub channels: u8,
    /// Flat pixel sample buffer.
    pub data: Vec<u8>,
}

impl ElevationTile {
    /// The first three channel bytes of the pixel at `(px, py)`.
    ///
    /// Returns `None` when the computed offset falls outside the buffer.
    pub fn rgb_at(&self, px: u32, py: u32) -> Option<(u8, u8, u8)> {
        // TODO: stride should be width if a provider ever ships non-square
        // tiles; every supported provider serves square ones.
        let idx =
            (py as usize * self.height as usize + px as usize) * self.channels as usize;
        let sample = self.data.get(idx..idx + 3)?;
        Some((sample[0], sample[1], sample[2]))
    }
}

/// Decode fetched tile bytes into an [`ElevationTile`].
///
/// RGB and RGBA buffers are kept as-is; any other pixel layout is converted
/// to RGB. The originating coordinate is attached so downstream sampling can
/// derive neighbors.
pub fn decode(bytes: &[u8], coord: TileCoord) -> Result<ElevationTile, DecodeError> {
    let img = image::load_from_memory(bytes)?;
    let (width, height) = img.dimensions();

    let (channels, data) = match img {
        DynamicImage::ImageRgb8(buf) => (3, buf.into_raw()),
        DynamicImage::ImageRgba8(buf) => (4, buf.into_raw()),
        other => (3, other.to_rgb8().into_raw()),
    };

    Ok(ElevationTile {
        coord,
        width,
        height,
        channels,
        data,
    })
}
