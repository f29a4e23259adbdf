//! Configuration management for Podex.
//!
//! Podex uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `PODEX_<SECTION>_<KEY>` environment overrides
//! - Default values for optional settings
//! - Validation on load
//!
//! # Example Configuration
//!
//! ```toml
//! [platform]
//! client_id = "my-export"
//! client_secret = "${PODEX_CLIENT_SECRET}"
//! username = "alice@example.com"
//! password = "${PODEX_PASSWORD}"
//!
//! [export]
//! output_dir = "podio-export"
//! rate_limit_per_hour = 1000
//! max_concurrency = 5
//! download_files = true
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use podex::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("podex.toml")?;
//! println!("Exporting to {}", config.export.output_dir);
//! # Ok(())
//! # }
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

pub use loader::{load_config, parse_config};
pub use schema::{
    ApplicationConfig, ExportConfig, LoggingConfig, NameCollisionPolicy, PlatformConfig,
    PodexConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
