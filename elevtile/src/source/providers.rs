//! Built-in tile providers.
//!
//! Each provider is a configuration constant applied to the one
//! [`TileSource`] type: a URL template, an RGB-to-elevation formula, a zoom
//! ceiling, and the native tile width. Keyed providers refuse construction
//! without an API key.

use std::sync::Arc;

use super::{AsyncHttpClient, SourceError, SourceOptions, SourceSpecs, TileSource};
use crate::coord::TileCoord;

/// Base URL for the AWS Open Data terrarium tile set.
const AWS_BASE_URL: &str = "https://s3.amazonaws.com/elevation-tiles-prod/terrarium";

/// Maximum zoom level served by the AWS terrarium tiles.
const AWS_MAX_ZOOM: u8 = 16;

/// Base URL for the NASADEM tile API.
const NASADEM_BASE_URL: &str = "https://www.nasadem.xyz/api/v1/dem";

/// Maximum zoom level served by NASADEM.
const NASADEM_MAX_ZOOM: u8 = 11;

/// Base URL for MapTiler terrain-RGB tiles.
const MAPTILER_BASE_URL: &str = "https://api.maptiler.com/tiles/terrain-rgb";

/// Maximum zoom level served by MapTiler terrain-RGB.
const MAPTILER_MAX_ZOOM: u8 = 11;

/// Base URL for Mapbox terrain-RGB tiles.
const MAPBOX_BASE_URL: &str = "https://api.mapbox.com/v4/mapbox.terrain-rgb";

/// Maximum zoom level served by Mapbox terrain-RGB.
const MAPBOX_MAX_ZOOM: u8 = 17;

impl TileSource {
    /// AWS Open Data terrarium tiles.
    ///
    /// Terrarium encoding: `r * 256 + g + b / 256 - 32768`. No API key
    /// required.
    pub fn aws(client: Arc<dyn AsyncHttpClient>, options: SourceOptions) -> Self {
        Self::custom(
            client,
            Arc::new(|coord: &TileCoord| format!("{}/{}.png", AWS_BASE_URL, coord)),
            Arc::new(|r, g, b| r as f64 * 256.0 + g as f64 + b as f64 / 256.0 - 32768.0),
            SourceSpecs {
                max_zoom: AWS_MAX_ZOOM,
                tile_width: 256,
            },
            options,
        )
    }

    /// NASADEM elevation tiles. Requires an API key.
    ///
    /// Encoding: `256 * r + g - 32768`.
    ///
    /// # Errors
    ///
    /// [`SourceError::MissingApiKey`] when `options.api_key` is `None`.
    pub fn nasadem(
        client: Arc<dyn AsyncHttpClient>,
        options: SourceOptions,
    ) -> Result<Self, SourceError> {
        let key = require_api_key("NASADEM", &options)?;

        Ok(Self::custom(
            client,
            Arc::new(move |coord: &TileCoord| {
                format!("{}/{}.png?key={}", NASADEM_BASE_URL, coord, key)
            }),
            Arc::new(|r, g, _| 256.0 * r as f64 + g as f64 - 32768.0),
            SourceSpecs {
                max_zoom: NASADEM_MAX_ZOOM,
                tile_width: 256,
            },
            options,
        ))
    }

    /// MapTiler terrain-RGB tiles. Requires an API key.
    ///
    /// Encoding: `-10000 + (r * 256 * 256 + g * 256 + b) * 0.1`.
    ///
    /// # Errors
    ///
    /// [`SourceError::MissingApiKey`] when `options.api_key` is `None`.
    pub fn maptiler(
        client: Arc<dyn AsyncHttpClient>,
        options: SourceOptions,
    ) -> Result<Self, SourceError> {
        let key = require_api_key("MapTiler", &options)?;

        Ok(Self::custom(
            client,
            Arc::new(move |coord: &TileCoord| {
                format!("{}/{}.png?key={}", MAPTILER_BASE_URL, coord, key)
            }),
            Arc::new(terrain_rgb_elevation),
            SourceSpecs {
                max_zoom: MAPTILER_MAX_ZOOM,
                tile_width: 512,
            },
            options,
        ))
    }

    /// Mapbox terrain-RGB tiles. Requires an API key (access token).
    ///
    /// Encoding: `-10000 + (r * 256 * 256 + g * 256 + b) * 0.1`.
    ///
    /// # Errors
    ///
    /// [`SourceError::MissingApiKey`] when `options.api_key` is `None`.
    pub fn mapbox(
        client: Arc<dyn AsyncHttpClient>,
        options: SourceOptions,
    ) -> Result<Self, SourceError> {
        let key = require_api_key("Mapbox", &options)?;

        Ok(Self::custom(
            client,
            Arc::new(move |coord: &TileCoord| {
                format!("{}/{}.pngraw?access_token={}", MAPBOX_BASE_URL, coord, key)
            }),
            Arc::new(terrain_rgb_elevation),
            SourceSpecs {
                max_zoom: MAPBOX_MAX_ZOOM,
                tile_width: 256,
            },
            options,
        ))
    }
}

/// The terrain-RGB decoding shared by MapTiler and Mapbox.
fn terrain_rgb_elevation(r: u8, g: u8, b: u8) -> f64 {
    -10000.0 + (r as f64 * 256.0 * 256.0 + g as f64 * 256.0 + b as f64) * 0.1
}

fn require_api_key(
    provider: &'static str,
    options: &SourceOptions,
) -> Result<String, SourceError> {
    options
        .api_key
        .clone()
        .ok_or(SourceError::MissingApiKey { provider })
}
