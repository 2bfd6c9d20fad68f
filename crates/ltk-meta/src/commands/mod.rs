mod inspect;
mod synthesize;

pub use inspect::*;
pub use synthesize::*;

use crate::errors::CliError;
use camino::{Utf8Path, Utf8PathBuf};
use ltk_meta_cache::{FsDefaultFiles, MetaCacheConfig, ModCollection};
use miette::Result;
use std::sync::Arc;

/// File name looked up next to the manifest when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "meta-cache.json";

/// Inputs shared by every command that builds a collection.
#[derive(Debug, Clone)]
pub struct CollectionArgs {
    pub collection: Utf8PathBuf,
    pub game_data: Option<Utf8PathBuf>,
    pub config: Option<Utf8PathBuf>,
}

/// Resolve the config: `--config`, then `meta-cache.json` beside the manifest,
/// then defaults. `--game-data` overrides the config's directory.
pub fn resolve_config(args: &CollectionArgs) -> Result<MetaCacheConfig> {
    let path = match &args.config {
        Some(path) => path.clone(),
        None => manifest_dir(&args.collection).join(DEFAULT_CONFIG_FILE),
    };

    let mut config = MetaCacheConfig::load(&path)
        .map_err(|e| CliError::config_parse_error(path.clone(), e))?
        .unwrap_or_default();
    if args.config.is_some() && !path.exists() {
        tracing::warn!("Config file {} not found, using defaults", path);
    }

    if let Some(game_data) = &args.game_data {
        config.game_data_dir = Some(game_data.clone());
    }
    Ok(config)
}

/// Load the collection named by `args` and recompute its cache.
pub fn load_collection(
    args: &CollectionArgs,
) -> Result<(ModCollection, MetaCacheConfig, ltk_meta_cache::RecomputeSummary)> {
    if !args.collection.exists() {
        return Err(CliError::collection_not_found(args.collection.clone()).into());
    }

    let config = resolve_config(args)?;
    let game_data = config
        .game_data_dir
        .clone()
        .ok_or(CliError::GameDataNotConfigured)?;
    if !game_data.is_dir() {
        return Err(CliError::game_data_not_found(game_data).into());
    }

    let provider = Arc::new(FsDefaultFiles::new(game_data));
    let mut collection = ModCollection::from_manifest(&args.collection, provider)
        .map_err(|source| CliError::CollectionLoadFailed { source })?;
    let summary = collection
        .recompute(&config)
        .map_err(|source| CliError::SynthesisFailed { source })?;

    Ok((collection, config, summary))
}

fn manifest_dir(manifest: &Utf8Path) -> &Utf8Path {
    manifest.parent().unwrap_or(Utf8Path::new(""))
}
