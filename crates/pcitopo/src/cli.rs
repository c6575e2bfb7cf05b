//! Command line interface definition

use clap::Parser;
use clap::Subcommand;
use pcitopo_core::FunctionAddress;
use pcitopo_core::enumerate::DEFAULT_ROOT;
use std::fmt::Display;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[clap(disable_help_subcommand = true)]
pub struct Cli {
    /// Directory containing the pciDDDD:BB host bridge directories
    #[arg(long, global = true, default_value = DEFAULT_ROOT)]
    pub root: PathBuf,
    /// Walk each PCI domain on its own thread
    #[arg(long, global = true)]
    pub parallel: bool,
    /// Output format to use
    #[arg(short, long, global = true, default_value_t = Format::Human)]
    pub format: Format,
    /// Operation to perform
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the whole topology
    Dump,
    /// Print a single function
    Show {
        /// Address of the function, for example 0000:00:1f.3
        address: FunctionAddress,
    },
    /// Print the number of domains, buses, devices and functions
    Summary,
}

/// Output format to use
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, clap::ValueEnum)]
pub enum Format {
    /// Human-readable output
    Human,
    /// JSON formatted output
    #[cfg(feature = "json")]
    Json,
}

impl Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Human => write!(f, "human"),
            #[cfg(feature = "json")]
            Self::Json => write!(f, "json"),
        }
    }
}
