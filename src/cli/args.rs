//! CLI argument definitions using clap
//!
//! Commands:
//! - orgquery serve --domain <d>
//! - orgquery call --domain <d> --operation <name> [--args <json>]
//! - orgquery list --domain <d>
//! - orgquery view --domain <d> --uri <uri>

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Overrides;
use crate::domains::DomainKind;

/// orgquery - query and aggregation engine over organizational data
#[derive(Parser, Debug)]
#[command(name = "orgquery")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct Target {
    /// Domain to load
    #[arg(long, value_enum)]
    pub domain: Option<DomainKind>,

    /// Path to a JSON configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Load datasets from <DATA_DIR>/<domain>/ instead of the embedded ones
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Minimum log severity (trace, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Target {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            domain: self.domain,
            data_dir: self.data_dir.clone(),
            log_level: self.log_level.clone(),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve JSON-RPC requests on stdin/stdout until end of input
    Serve {
        #[command(flatten)]
        target: Target,
    },

    /// Execute a single operation and exit
    Call {
        #[command(flatten)]
        target: Target,

        /// Operation name
        #[arg(long)]
        operation: String,

        /// Arguments as a JSON object
        #[arg(long)]
        args: Option<String>,
    },

    /// Print the operation and view catalogs
    List {
        #[command(flatten)]
        target: Target,
    },

    /// Print one summary view
    View {
        #[command(flatten)]
        target: Target,

        /// View URI, e.g. crm://summary
        #[arg(long)]
        uri: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
