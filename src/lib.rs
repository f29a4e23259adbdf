// Podex - Hierarchical Platform Exporter
// Copyright (c) 2025 Podex Contributors
// Licensed under the MIT License

//! # Podex - Hierarchical Platform Exporter
//!
//! Podex exports everything an account can see on a Podio-style work platform
//! (organizations, spaces, applications, items, tasks, contacts and file
//! attachments) into a directory tree of JSON files and binaries, under one
//! global API rate limit.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Walking** the account hierarchy with bounded concurrency per level
//! - **Paginating** collections, either page by page or by fanning out over
//!   precomputed offsets
//! - **Downloading** file attachments as streams
//! - **Validating** the export by comparing observed and server-reported counts
//!
//! ## Architecture
//!
//! Podex follows a layered architecture:
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (export walk, rate limiting, validation)
//! - [`adapters`] - External integrations (platform API, filesystem)
//! - [`domain`] - Core domain types and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use podex::config::load_config;
//! use podex::core::export::ExportCoordinator;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("podex.toml")?;
//!     let coordinator = ExportCoordinator::new(config).await?;
//!     let report = coordinator.execute_export().await?;
//!
//!     match report.error {
//!         None => println!("Export complete"),
//!         Some(e) => eprintln!("Export failed: {e}"),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Rate Limiting
//!
//! Every platform call, downloads included, takes a token from one shared
//! [`core::rate_limit::RateLimiter`]. The bucket starts full and refills
//! continuously over a rolling hour:
//!
//! ```rust,no_run
//! use podex::core::rate_limit::RateLimiter;
//!
//! # async fn example() {
//! let limiter = RateLimiter::per_hour(1000);
//! limiter.acquire().await;
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Podex uses the [`domain::PodexError`] type for all errors. Export failures
//! are never retried: a failed run is fixed and re-run from scratch.
//!
//! ```rust,no_run
//! use podex::domain::PodexError;
//!
//! fn example() -> Result<(), PodexError> {
//!     let config = podex::config::load_config("podex.toml")?;
//!     Ok(())
//! }
//! ```
//!
//! ## Logging
//!
//! Podex uses structured logging with the `tracing` crate:
//!
//! ```rust,no_run
//! use tracing::{info, warn};
//!
//! info!(path = "Acme/Sales/Leads/items_1-500.json", "Exported");
//! warn!(file_id = 42, kind = "timeout", "Ignoring stream fault");
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
