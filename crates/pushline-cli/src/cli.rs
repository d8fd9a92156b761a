//! Command-line interface definitions and parsing

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use pushline_core::ForegroundPolicy;

use crate::config::ConfigOverrides;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// What the foreground listener does with notification-bearing messages
    #[arg(long, value_enum)]
    pub foreground: Option<ForegroundArg>,

    /// Do not acquire the session right after the pipeline starts
    #[arg(long)]
    pub no_warm_up: bool,

    /// Total time allowed for the messaging bridge to become ready
    #[arg(long)]
    pub ready_timeout_ms: Option<u64>,

    /// Number of message ids remembered for deduplication
    #[arg(long)]
    pub dedup_capacity: Option<usize>,

    /// Use small registration channel buffers
    #[arg(long)]
    pub low_memory: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ForegroundArg {
    Suppress,
    Mirror,
}

impl From<ForegroundArg> for ForegroundPolicy {
    fn from(arg: ForegroundArg) -> Self {
        match arg {
            ForegroundArg::Suppress => ForegroundPolicy::Suppress,
            ForegroundArg::Mirror => ForegroundPolicy::Mirror,
        }
    }
}

impl Cli {
    /// Configuration values set on the command line
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            foreground: self.foreground.map(ForegroundPolicy::from),
            warm_up: self.no_warm_up.then_some(false),
            ready_timeout_ms: self.ready_timeout_ms,
            dedup_capacity: self.dedup_capacity,
            low_memory: self.low_memory,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Replay a scenario file through a full pipeline
    Simulate {
        /// Scenario file (JSON)
        #[arg(short, long)]
        scenario: PathBuf,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Classify a single remote message given as JSON
    Classify {
        /// Message JSON, e.g. '{"messageId":"1","data":{"title":"T","body":"B"}}'
        message: String,
        /// Classify as the foreground listener does with mirroring enabled
        #[arg(long)]
        mirror: bool,
    },
    /// Validate the configuration and the embedded provider record
    CheckConfig,
    /// Print an example configuration file
    ExampleConfig,
}
