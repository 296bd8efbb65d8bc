//! # nwbconv
//!
//! Command-line tool for converting neurophysiology recordings to NWB.
//!
//! ## Usage
//!
//! ```bash
//! # Convert the audio files listed in a config
//! nwbconv -v convert --config conversion.toml
//!
//! # Print the metadata schema of the audio interface
//! nwbconv schema --kind metadata
//!
//! # Show what a container holds
//! nwbconv inspect session.nwb
//! ```

use anyhow::Result;
use clap::Parser;

mod cli;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli::init_logging(cli.verbosity());
    cli::dispatch(cli)
}
