use anyhow::{Result, ensure};
use clap::Args;
use std::path::PathBuf;
use tilebucket::{
	core::{RasterArray, TileCoord},
	store::WriteOutcome,
};

#[derive(Args, Debug)]
#[command(arg_required_else_help = true, disable_version_flag = true)]
pub struct Subcommand {
	/// YAML configuration of the output
	#[arg(required = true)]
	config: PathBuf,

	/// tiles as zoom/row/col
	#[arg(required = true, num_args = 1..)]
	tiles: Vec<TileCoord>,

	/// sample value of every band and pixel
	#[arg(long, allow_negative_numbers = true)]
	value: f64,

	/// width and height of the tiles in pixels
	#[arg(long, default_value_t = 256)]
	size: usize,
}

#[tokio::main]
pub async fn run(arguments: &Subcommand) -> Result<()> {
	let store = super::open_store(&arguments.config)?;
	let profile = store.profile();
	let (min, max) = profile.dtype.value_range();
	ensure!(
		(arguments.value.is_nan() && !profile.dtype.is_integer()) || (min..=max).contains(&arguments.value),
		"value {} does not fit data type {}",
		arguments.value,
		profile.dtype
	);

	let tile = RasterArray::filled(
		usize::from(profile.bands),
		arguments.size,
		arguments.size,
		profile.dtype,
		arguments.value,
	)?;

	for coord in &arguments.tiles {
		match store.write_tile(coord, tile.clone()).await? {
			WriteOutcome::Written => log::info!("wrote {}", store.get_path(coord)),
			WriteOutcome::SkippedEmpty => log::info!("skipped empty tile {coord}"),
		}
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use crate::{tests::run_command, tools::test_utilities::local_config};

	#[test]
	fn writes_tiles() {
		let (dir, config) = local_config();
		run_command(vec!["tilebucket", "fill", &config, "2/3/5", "--value", "7", "--size", "16"]).unwrap();
		assert!(dir.path().join("tiles/run1/2/3/5.png").is_file());
	}

	#[test]
	fn skips_nodata_tiles() {
		let (dir, config) = local_config();
		run_command(vec!["tilebucket", "fill", &config, "2/3/5", "--value", "0"]).unwrap();
		assert!(!dir.path().join("tiles/run1/2/3/5.png").exists());
	}

	#[test]
	fn rejects_values_outside_the_data_type() {
		let (_dir, config) = local_config();
		assert!(run_command(vec!["tilebucket", "fill", &config, "2/3/5", "--value", "-3"]).is_err());
	}
}
