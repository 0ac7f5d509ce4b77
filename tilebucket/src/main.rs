// Import necessary modules and dependencies
mod tools;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{ErrorLevel, Verbosity};

// Define the command-line interface using the clap crate
#[derive(Parser, Debug)]
#[command(
	author, // Set the author
	version, // Set the version
	about, // Set a short description
	long_about = None, // Disable long description
	propagate_version = true, // Enable version flag for subcommands
	disable_help_subcommand = true, // Disable help subcommand
)]
struct Cli {
	#[command(subcommand)]
	command: Commands, // Set subcommands

	#[command(flatten)]
	verbose: Verbosity<ErrorLevel>, // Set verbosity flag
}

// Subcommands, one module in `tools` each
#[derive(Subcommand, Debug)]
enum Commands {
	/// Print object keys and URLs of tiles
	Key(tools::key::Subcommand),

	/// Check whether tiles have been written
	Exists(tools::exists::Subcommand),

	/// List the tiles written under the output prefix
	List(tools::list::Subcommand),

	#[clap(alias = "rm")]
	/// Delete tiles
	Delete(tools::delete::Subcommand),

	/// Write tiles filled with a constant value
	Fill(tools::fill::Subcommand),

	/// Show the output profile and count written tiles per zoom level
	Probe(tools::probe::Subcommand),
}

// Parse the arguments, set up logging and run the subcommand
fn main() -> Result<()> {
	let cli = Cli::parse();

	// Log level follows -v/-q
	env_logger::Builder::new()
		.filter_level(cli.verbose.log_level_filter())
		.format_timestamp(None)
		.init();

	run(&cli)
}

// Dispatch to the subcommand
fn run(cli: &Cli) -> Result<()> {
	match &cli.command {
		Commands::Key(arguments) => tools::key::run(arguments),
		Commands::Exists(arguments) => tools::exists::run(arguments),
		Commands::List(arguments) => tools::list::run(arguments),
		Commands::Delete(arguments) => tools::delete::run(arguments),
		Commands::Fill(arguments) => tools::fill::run(arguments),
		Commands::Probe(arguments) => tools::probe::run(arguments),
	}
}
