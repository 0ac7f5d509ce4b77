use anyhow::{Result, bail};
use clap::Args;
use std::path::PathBuf;
use tilebucket::core::TileCoord;

#[derive(Args, Debug)]
#[command(arg_required_else_help = true, disable_version_flag = true)]
pub struct Subcommand {
	/// YAML configuration of the output
	#[arg(required = true)]
	config: PathBuf,

	/// tiles as zoom/row/col
	#[arg(required = true, num_args = 1..)]
	tiles: Vec<TileCoord>,

	/// fail unless every tile exists
	#[arg(long)]
	all: bool,
}

#[tokio::main]
pub async fn run(arguments: &Subcommand) -> Result<()> {
	let store = super::open_store(&arguments.config)?;
	let found = store.tiles_exist(&arguments.tiles).await?;

	for (coord, exists) in arguments.tiles.iter().zip(&found) {
		println!("{coord}\t{}", if *exists { "yes" } else { "no" });
	}

	let missing = found.iter().filter(|exists| !**exists).count();
	if arguments.all && missing > 0 {
		bail!("{missing} of {} tiles are missing", arguments.tiles.len());
	}
	Ok(())
}
