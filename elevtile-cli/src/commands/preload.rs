//! Bulk tile preloading command.

use std::path::PathBuf;

use clap::Args;
use elevtile::Point;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

use super::common::{build_factory, SourceArgs};
use crate::error::CliError;

/// A bounding box given as `west,south,east,north`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bbox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

fn parse_bbox(s: &str) -> Result<Bbox, String> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 4 {
        return Err(format!(
            "expected west,south,east,north; got {} components",
            parts.len()
        ));
    }

    let mut values = [0.0; 4];
    for (slot, part) in values.iter_mut().zip(&parts) {
        *slot = part
            .trim()
            .parse::<f64>()
            .map_err(|e| format!("invalid coordinate '{}': {}", part, e))?;
    }

    Ok(Bbox {
        west: values[0],
        south: values[1],
        east: values[2],
        north: values[3],
    })
}

/// Arguments for `elevtile preload`.
#[derive(Debug, Args)]
pub struct PreloadArgs {
    /// Bounding box as west,south,east,north (degrees, either corner order)
    #[arg(long, value_parser = parse_bbox, allow_hyphen_values = true)]
    pub bbox: Bbox,

    /// Lowest zoom level to preload
    #[arg(long)]
    pub min_zoom: u8,

    /// Highest zoom level to preload
    #[arg(long)]
    pub max_zoom: u8,

    /// Directory tiles are persisted under
    #[arg(long)]
    pub cache_dir: PathBuf,

    #[command(flatten)]
    pub source: SourceArgs,
}

/// Download every tile covering the box at each requested zoom level.
pub async fn run(args: PreloadArgs) -> Result<(), CliError> {
    if args.min_zoom > args.max_zoom {
        return Err(CliError::Input(format!(
            "--min-zoom {} exceeds --max-zoom {}",
            args.min_zoom, args.max_zoom
        )));
    }

    let factory = build_factory(&args.source, Some(&args.cache_dir))?;

    let pending = factory.pre_load_bbox(
        Point::new(args.bbox.west, args.bbox.south),
        Point::new(args.bbox.east, args.bbox.north),
        args.min_zoom,
        args.max_zoom,
    );

    let bar = ProgressBar::new(pending.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} tiles {msg}")
            .expect("static progress template"),
    );

    let mut loaded = 0usize;
    let mut failed = 0usize;

    for entry in pending {
        match entry.await {
            Ok(_) => loaded += 1,
            Err(err) => {
                failed += 1;
                warn!(error = %err, "tile preload failed");
            }
        }
        bar.inc(1);
    }

    bar.finish_and_clear();
    println!("{} tiles loaded, {} failed", loaded, failed);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bbox() {
        let bbox = parse_bbox("-18.0,28.5,-17.7,28.9").unwrap();
        assert_eq!(
            bbox,
            Bbox {
                west: -18.0,
                south: 28.5,
                east: -17.7,
                north: 28.9,
            }
        );
    }

    #[test]
    fn test_parse_bbox_tolerates_spaces() {
        let bbox = parse_bbox("-18.0, 28.5, -17.7, 28.9").unwrap();
        assert_eq!(bbox.north, 28.9);
    }

    #[test]
    fn test_parse_bbox_wrong_arity() {
        assert!(parse_bbox("1,2,3").is_err());
        assert!(parse_bbox("1,2,3,4,5").is_err());
    }

    #[test]
    fn test_parse_bbox_bad_number() {
        let err = parse_bbox("a,2,3,4").unwrap_err();
        assert!(err.contains("invalid coordinate"));
    }
}
