//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for Podex using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Podex - hierarchical platform exporter
#[derive(Parser, Debug)]
#[command(name = "podex")]
#[command(version, about, long_about = None)]
#[command(author = "Podex Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "podex.toml", env = "PODEX_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "PODEX_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export every organization, space and application of the account
    Export(commands::export::ExportArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Re-check the counts of a written summary.json
    CheckSummary(commands::check_summary::CheckSummaryArgs),
}
