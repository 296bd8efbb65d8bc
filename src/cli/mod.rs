use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

mod config;
mod convert;
mod inspect;
mod schema;

/// nwbconv - Neurophysiology to NWB Converter
#[derive(Parser)]
#[command(name = "nwbconv")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Which audio interface schema to print.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum SchemaKind {
    /// Constructor arguments
    Source,
    /// Metadata Document shape
    #[default]
    Metadata,
    /// Conversion options
    Options,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert audio files to an NWB container, driven by a TOML config
    Convert {
        /// Conversion config file
        #[arg(short, long, value_name = "FILE")]
        config: PathBuf,

        /// Replace an existing output file instead of appending to it
        #[arg(long)]
        overwrite: bool,
    },

    /// Print a JSON schema of the audio interface
    Schema {
        /// Schema to print
        #[arg(short, long, default_value = "metadata", value_enum)]
        kind: SchemaKind,
    },

    /// Display file-level fields and the hierarchy of an NWB container
    Inspect {
        /// Input .nwb file path
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

impl Cli {
    pub fn verbosity(&self) -> u8 {
        self.verbose
    }
}

pub fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

pub fn dispatch(cli: Cli) -> Result<()> {
    let verbose = cli.verbose > 0;
    match cli.command {
        Commands::Convert { config, overwrite } => convert::run(config, overwrite, verbose),
        Commands::Schema { kind } => schema::run(kind),
        Commands::Inspect { file } => inspect::run(file),
    }
}
