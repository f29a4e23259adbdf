//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the Podex configuration file.

use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration file loaded successfully");
                c
            }
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        match config.validate() {
            Ok(_) => {
                println!("✅ Configuration is valid");
                println!();
                println!("Configuration Summary:");
                println!("  Log Level: {}", config.application.log_level);
                println!("  Platform: {}", config.platform.base_url);
                println!("  Account: {}", config.platform.username);
                println!("  Output Directory: {}", config.export.output_dir);
                println!("  Rate Limit: {}/hour", config.export.rate_limit_per_hour);
                println!("  Max Concurrency: {}", config.export.max_concurrency);
                println!("  Download Files: {}", config.export.download_files);
                println!(
                    "  Page Sizes: items={} tasks={} files={} contacts={}",
                    config.export.item_page_size,
                    config.export.task_page_size,
                    config.export.file_page_size,
                    config.export.contact_page_size
                );
                println!("  Name Collisions: {:?}", config.export.name_collision);
                if !config.export.transport_warning_kinds.is_empty() {
                    println!(
                        "  Warning-only Stream Faults: {}",
                        config.export.transport_warning_kinds.join(", ")
                    );
                }
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                println!();
                Ok(2) // Configuration error exit code
            }
        }
    }
}
