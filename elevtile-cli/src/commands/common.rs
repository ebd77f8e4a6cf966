//! Shared provider and factory plumbing for CLI commands.

use std::path::Path;
use std::sync::Arc;

use clap::{Args, ValueEnum};
use elevtile::{
    ElevationFactory, FileTileCache, MemoryTileCache, ReqwestClient, SourceOptions, TileCache,
    TileSource,
};

use crate::error::CliError;

/// Elevation tile provider selection for CLI arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProviderType {
    /// AWS Open Data terrarium tiles (no API key required)
    Aws,
    /// NASADEM tiles (requires --api-key)
    Nasadem,
    /// MapTiler terrain-RGB tiles (requires --api-key)
    Maptiler,
    /// Mapbox terrain-RGB tiles (requires --api-key)
    Mapbox,
}

/// Source-related arguments shared by every command.
#[derive(Debug, Args)]
pub struct SourceArgs {
    /// Tile provider
    #[arg(long, value_enum, default_value_t = ProviderType::Aws)]
    pub provider: ProviderType,

    /// API key for providers that require one
    #[arg(long)]
    pub api_key: Option<String>,

    /// Maximum simultaneous tile fetches
    #[arg(long, default_value_t = 4)]
    pub concurrency: usize,

    /// Retries per tile after the first attempt
    #[arg(long, default_value_t = 4)]
    pub retries: u32,
}

impl SourceArgs {
    /// Build the configured tile source.
    pub fn build_source(&self) -> Result<Arc<TileSource>, CliError> {
        let client = Arc::new(ReqwestClient::new()?);
        let options = SourceOptions {
            concurrency: self.concurrency,
            num_retries: self.retries,
            api_key: self.api_key.clone(),
        };

        let source = match self.provider {
            ProviderType::Aws => TileSource::aws(client, options),
            ProviderType::Nasadem => TileSource::nasadem(client, options)?,
            ProviderType::Maptiler => TileSource::maptiler(client, options)?,
            ProviderType::Mapbox => TileSource::mapbox(client, options)?,
        };

        Ok(Arc::new(source))
    }
}

/// Build an elevation factory over the configured source, persisting tiles
/// when a cache directory is given.
pub fn build_factory(
    source: &SourceArgs,
    cache_dir: Option<&Path>,
) -> Result<ElevationFactory, CliError> {
    let source = source.build_source()?;

    let cache: Arc<dyn TileCache> = match cache_dir {
        Some(dir) => Arc::new(FileTileCache::new(dir)),
        None => Arc::new(MemoryTileCache::new()),
    };

    Ok(ElevationFactory::new(source, cache))
}
