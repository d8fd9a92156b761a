//! pushline CLI library
//!
//! Configuration loading, scenario replay and the command handlers behind the
//! `pushline` binary.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod scenario;

pub use cli::{Cli, Commands};
pub use config::{AppConfig, ConfigOverrides};
pub use error::{CliError, Result};
pub use scenario::{Scenario, ScenarioReport, ScenarioRunner};
