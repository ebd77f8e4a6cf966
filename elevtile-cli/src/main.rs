//! Elevtile CLI - Command-line interface
//!
//! This binary provides a command-line interface to the elevtile library:
//! single-point elevation queries and bulk tile preloading.

mod commands;
mod error;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "elevtile", version, about = "Elevation lookup from remote terrain tiles")]
struct Cli {
    /// Enable debug logging (otherwise honors RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Resolve the elevation at one geographic point
    Z(commands::z::ZArgs),
    /// Download the tiles covering a bounding box into a file cache
    Preload(commands::preload::PreloadArgs),
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("elevtile=debug,elevtile_cli=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Command::Z(args) => commands::z::run(args).await,
        Command::Preload(args) => commands::preload::run(args).await,
    };

    if let Err(err) = result {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_structure_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_z_command() {
        let cli = Cli::try_parse_from([
            "elevtile", "z", "--lon", "-17.86", "--lat", "28.75", "--zoom", "11",
        ])
        .unwrap();

        match cli.command {
            Command::Z(args) => {
                assert_eq!(args.zoom, 11);
            }
            other => panic!("expected z command, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_preload_command() {
        let cli = Cli::try_parse_from([
            "elevtile",
            "preload",
            "--bbox",
            "-18.0,28.5,-17.7,28.9",
            "--min-zoom",
            "8",
            "--max-zoom",
            "11",
            "--cache-dir",
            "/tmp/tiles",
        ])
        .unwrap();

        match cli.command {
            Command::Preload(args) => {
                assert_eq!(args.min_zoom, 8);
                assert_eq!(args.max_zoom, 11);
            }
            other => panic!("expected preload command, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["elevtile"]).is_err());
    }
}
