//! Single-point elevation query command.

use std::path::PathBuf;

use clap::Args;
use elevtile::{Point, SampleMethod};

use super::common::{build_factory, SourceArgs};
use crate::error::CliError;

/// Arguments for `elevtile z`.
#[derive(Debug, Args)]
pub struct ZArgs {
    /// Longitude in degrees
    #[arg(long, allow_negative_numbers = true)]
    pub lon: f64,

    /// Latitude in degrees
    #[arg(long, allow_negative_numbers = true)]
    pub lat: f64,

    /// Zoom level to sample at
    #[arg(long)]
    pub zoom: u8,

    /// Sampling method: nearest or bilinear
    #[arg(long, default_value = "bilinear")]
    pub method: SampleMethod,

    /// Persist fetched tiles under this directory
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    #[command(flatten)]
    pub source: SourceArgs,
}

/// Run the query and print the elevation in meters.
///
/// An unavailable elevation prints as `NaN`; only configuration failures
/// exit non-zero.
pub async fn run(args: ZArgs) -> Result<(), CliError> {
    let factory = build_factory(&args.source, args.cache_dir.as_deref())?;

    let elevation = factory
        .get_z_with(Point::new(args.lon, args.lat), args.zoom, args.method)
        .await;

    if elevation.is_nan() {
        println!("NaN");
    } else {
        println!("{:.2}", elevation);
    }

    Ok(())
}
