use anyhow::Result;
use clap::Args;
use futures::TryStreamExt;
use std::{collections::BTreeMap, path::PathBuf};
use tilebucket::{core::TileCoord, store::TileFilter};

#[derive(Args, Debug)]
#[command(arg_required_else_help = true, disable_version_flag = true)]
pub struct Subcommand {
	/// YAML configuration of the output
	#[arg(required = true)]
	config: PathBuf,

	/// skip counting the written tiles
	#[arg(long)]
	no_scan: bool,
}

#[tokio::main]
pub async fn run(arguments: &Subcommand) -> Result<()> {
	let store = super::open_store(&arguments.config)?;
	let profile = store.profile();

	println!("output: s3://{}/{}", profile.bucket, store.key_builder().prefix());
	println!("driver: {} ({})", profile.driver, profile.driver.extension());
	println!("bands: {}", profile.bands);
	println!("dtype: {}", profile.dtype);
	match profile.nodata {
		Some(nodata) => println!("nodata: {nodata}"),
		None => println!("nodata: none"),
	}
	println!("compress: {:?}", profile.options.compress);
	for (key, value) in &profile.options.passthrough {
		println!("option {key}: {value}");
	}
	println!("skip_empty: {}", profile.skip_empty);

	if arguments.no_scan {
		return Ok(());
	}

	let counts = store
		.list_written_tiles(TileFilter::All)
		.try_fold(BTreeMap::<u8, u64>::new(), |mut counts, coord: TileCoord| async move {
			*counts.entry(coord.zoom).or_default() += 1;
			Ok(counts)
		})
		.await?;

	println!("tiles: {}", counts.values().sum::<u64>());
	for (zoom, count) in &counts {
		println!("  zoom {zoom}: {count}");
	}
	Ok(())
}
