use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use tilebucket::core::{KeyBuilder, TileCoord};

#[derive(Args, Debug)]
#[command(arg_required_else_help = true, disable_version_flag = true)]
pub struct Subcommand {
	/// YAML configuration of the output
	#[arg(required = true)]
	config: PathBuf,

	/// tiles as zoom/row/col
	#[arg(required = true, num_args = 1..)]
	tiles: Vec<TileCoord>,

	/// print the object key instead of the s3:// URL
	#[arg(long)]
	key_only: bool,
}

pub fn run(arguments: &Subcommand) -> Result<()> {
	let profile = super::load_config(&arguments.config)?.to_output_profile()?;
	let keys = KeyBuilder::from_profile(&profile);

	for coord in &arguments.tiles {
		if arguments.key_only {
			println!("{}", keys.build_key(coord));
		} else {
			println!("{}", keys.get_path(coord));
		}
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use crate::{tests::run_command, tools::test_utilities::local_config};

	#[test]
	fn prints_paths() {
		let (_dir, config) = local_config();
		run_command(vec!["tilebucket", "key", &config, "5/15/32", "0/0/0"]).unwrap();
		run_command(vec!["tilebucket", "key", "--key-only", &config, "5/15/32"]).unwrap();
	}

	#[test]
	fn rejects_invalid_tiles() {
		let (_dir, config) = local_config();
		let error = run_command(vec!["tilebucket", "key", &config, "5/-1/32"]).unwrap_err();
		assert!(error.to_string().contains("row (-1) is out of range"), "{error}");
	}

	#[test]
	fn missing_config() {
		let error = run_command(vec!["tilebucket", "key", "/does/not/exist.yaml", "1/0/0"]).unwrap_err();
		assert!(format!("{error:#}").contains("loading configuration"));
	}
}
