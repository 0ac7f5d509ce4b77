use anyhow::Result;
use clap::Args;
use futures::TryStreamExt;
use std::path::PathBuf;
use tilebucket::{
	core::{MAX_ZOOM, TileCoord},
	store::TileFilter,
};

#[derive(Args, Debug)]
#[command(arg_required_else_help = true, disable_version_flag = true)]
pub struct Subcommand {
	/// YAML configuration of the output
	#[arg(required = true)]
	config: PathBuf,

	/// lowest zoom level to list
	#[arg(long, value_name = "int", value_parser = clap::value_parser!(u8).range(..=i64::from(MAX_ZOOM)))]
	min_zoom: Option<u8>,

	/// highest zoom level to list
	#[arg(long, value_name = "int", value_parser = clap::value_parser!(u8).range(..=i64::from(MAX_ZOOM)))]
	max_zoom: Option<u8>,

	/// print s3:// URLs instead of coordinates
	#[arg(long)]
	urls: bool,
}

impl Subcommand {
	fn filter(&self) -> TileFilter {
		if self.min_zoom.is_none() && self.max_zoom.is_none() {
			return TileFilter::All;
		}
		TileFilter::Zoom(self.min_zoom.unwrap_or(0)..=self.max_zoom.unwrap_or(MAX_ZOOM))
	}
}

#[tokio::main]
pub async fn run(arguments: &Subcommand) -> Result<()> {
	let store = super::open_store(&arguments.config)?;

	let mut tiles: Vec<TileCoord> = store.list_written_tiles(arguments.filter()).try_collect().await?;
	tiles.sort();
	log::info!("found {} tiles", tiles.len());

	for coord in &tiles {
		if arguments.urls {
			println!("{}", store.get_path(coord));
		} else {
			println!("{coord}");
		}
	}
	Ok(())
}
