pub mod delete;
pub mod exists;
pub mod fill;
pub mod key;
pub mod list;
pub mod probe;

use anyhow::{Context, Result};
use std::path::Path;
use tilebucket::{core::config::OutputConfig, store::TileStore};

/// Loads the output configuration at `path`.
pub fn load_config(path: &Path) -> Result<OutputConfig> {
	OutputConfig::from_path(path).with_context(|| format!("loading configuration {path:?}"))
}

/// Loads the output configuration at `path` and connects its tile store.
pub fn open_store(path: &Path) -> Result<TileStore> {
	let config = load_config(path)?;
	TileStore::from_config(&config).with_context(|| format!("opening the tile store configured in {path:?}"))
}
