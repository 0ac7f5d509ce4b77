use anyhow::Result;
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
}

#[tokio::main]
pub async fn run(arguments: &Subcommand) -> Result<()> {
	let store = super::open_store(&arguments.config)?;

	for coord in &arguments.tiles {
		store.delete_tile(coord).await?;
		log::info!("deleted {}", store.get_path(coord));
	}
	Ok(())
}
