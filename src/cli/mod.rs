//! CLI argument definitions for nickelconf.

use clap::{Parser, Subcommand};

use crate::settings::Setting;

/// Long version string with build metadata.
pub const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("NICKELCONF_GIT_COMMIT"),
    " ",
    env!("NICKELCONF_BUILD_TIMESTAMP"),
    ")"
);

/// nickelconf - Read and change the front light settings in Kobo eReader.conf.
///
/// Only the `[PowerOptions]` entries are touched; every other line of the file
/// is written back exactly as it was.
#[derive(Parser, Debug)]
#[command(name = "nickelconf")]
#[command(author, version, long_version = LONG_VERSION, about = "Read and change front light settings in Kobo eReader.conf", long_about = None)]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    /// Path to the config file.
    /// Falls back to NICKELCONF_PATH, then to the on-device location.
    #[arg(short = 'c', long = "config", global = true)]
    pub config_path: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the current value of a setting
    ///
    /// Reading front-light-level writes the default level if it is missing.
    Get {
        /// Setting to read
        #[arg(value_enum)]
        setting: Setting,
    },

    /// Change a setting
    ///
    /// Integers are range-checked and booleans must be `true` or `false`.
    /// front-light-state is only updated if the file already has it.
    Set {
        /// Setting to change
        #[arg(value_enum)]
        setting: Setting,

        /// New value
        #[arg(allow_hyphen_values = true)]
        value: String,
    },

    /// Print all power settings
    Show,

    /// Print which config file would be used and why
    Where,
}

impl Commands {
    /// Short command name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Get { .. } => "get",
            Commands::Set { .. } => "set",
            Commands::Show => "show",
            Commands::Where => "where",
        }
    }
}
