//! Core business logic for Podex.
//!
//! # Modules
//!
//! - [`export`] - Tree walk, pagination, downloads and the export summary
//! - [`rate_limit`] - Global token bucket shared by every platform call
//! - [`verification`] - Post-export count validation
//!
//! # Export Workflow
//!
//! 1. **Authenticate**: Password flow against the platform
//! 2. **Walk**: Organizations, spaces and applications, with contacts at the
//!    account level and tasks per organization
//! 3. **Collect**: Items, file listings and binaries per application
//! 4. **Validate**: Compare observed and reported counts in the summary
//! 5. **Report**: Write `summary.json` next to the exported tree
//!
//! # Example
//!
//! ```rust,no_run
//! use podex::config::load_config;
//! use podex::core::export::ExportCoordinator;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("podex.toml")?;
//! let coordinator = ExportCoordinator::new(config).await?;
//! let report = coordinator.execute_export().await?;
//!
//! if let Some(error) = &report.error {
//!     eprintln!("Export failed: {error}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod export;
pub mod rate_limit;
pub mod verification;
