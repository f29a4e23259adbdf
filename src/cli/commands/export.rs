//! Export command implementation
//!
//! This module implements the `export` command for exporting an account's
//! whole hierarchy to the local filesystem.

use crate::config::{load_config, PodexConfig};
use crate::core::export::{ExportCoordinator, ExportReport};
use crate::domain::PodexError;
use clap::Args;

/// Arguments for the export command
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Override the output directory
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<String>,

    /// Export file listings but do not download the files
    #[arg(long)]
    pub no_files: bool,
}

impl ExportArgs {
    /// Execute the export command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Starting export command");

        let mut config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("Failed to load configuration: {e}");
                return Ok(2);
            }
        };
        self.apply_overrides(&mut config);

        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "Configuration validation failed");
            eprintln!("Configuration validation failed: {e}");
            return Ok(2); // Configuration error exit code
        }

        if !self.yes {
            println!("Export Configuration:");
            println!("  Account: {}", config.platform.username);
            println!("  Output: {}", config.export.output_dir);
            println!("  Download files: {}", config.export.download_files);
            println!("  Rate limit: {}/hour", config.export.rate_limit_per_hour);
            println!("  Concurrency: {}", config.export.max_concurrency);
            println!();
            print!("Proceed with export? [y/N]: ");
            use std::io::{self, Write};
            io::stdout().flush()?;

            let mut input = String::new();
            io::stdin().read_line(&mut input)?;

            if !input.trim().eq_ignore_ascii_case("y") {
                println!("Export cancelled.");
                return Ok(0);
            }
        }

        tracing::info!("Creating export coordinator");
        let coordinator = match ExportCoordinator::new(config).await {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to create export coordinator");
                eprintln!("Failed to initialize export: {e}");
                return Ok(4); // Connection error exit code
            }
        };

        println!("🚀 Starting export...");
        println!();

        let report = match coordinator.execute_export().await {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(error = %e, "Export failed");
                eprintln!("Export failed: {e}");
                return Ok(exit_code_for(&e));
            }
        };

        print_report(&report);
        Ok(match &report.error {
            None => 0,
            Some(e) => exit_code_for(e),
        })
    }

    fn apply_overrides(&self, config: &mut PodexConfig) {
        if let Some(dir) = &self.output_dir {
            tracing::info!(output_dir = %dir, "Overriding output directory from CLI");
            config.export.output_dir = dir.clone();
        }
        if self.no_files {
            tracing::info!("Disabling file downloads from CLI");
            config.export.download_files = false;
        }
    }
}

/// Process exit code for an export failure
pub fn exit_code_for(error: &PodexError) -> i32 {
    match error {
        PodexError::Validation { .. } => 1,
        PodexError::Configuration(_) => 2,
        PodexError::Authentication(_) => 4,
        _ => 5,
    }
}

fn print_report(report: &ExportReport) {
    println!();
    println!("📊 Export Summary:");
    println!("  Duration: {:.2}s", report.duration.as_secs_f64());
    if let Some(path) = &report.summary_path {
        println!("  Summary: {}", path.display());
    }
    println!();

    match &report.error {
        None => println!("✅ Export completed successfully!"),
        Some(e) if e.is_validation() => {
            println!("⚠️  Export finished but counts do not match:");
            println!("   {e}");
        }
        Some(e) => {
            println!("❌ Export failed:");
            println!("   {e}");
            println!("   Re-run the export from scratch once the cause is fixed.");
        }
    }
}
