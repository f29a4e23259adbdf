//! External system integrations for Podex.
//!
//! - [`platform`] - remote platform API (trait, HTTP client, sessions, rate limiting)
//! - [`storage`] - local filesystem sink for the export tree
//!
//! # Design Pattern
//!
//! Adapters isolate external dependencies behind small interfaces so the
//! export core can be driven by in-memory fakes in tests:
//!
//! ```rust,no_run
//! use podex::adapters::platform::{HttpPlatformClient, MemorySessionStore, PlatformApi, Method};
//! use podex::config::load_config;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("podex.toml")?;
//! let client = HttpPlatformClient::new(config.platform, Arc::new(MemorySessionStore::new()))?;
//! client.ensure_authenticated().await?;
//! let orgs = client.request(Method::Get, "/org/", None).await?;
//! # Ok(())
//! # }
//! ```

pub mod platform;
pub mod storage;
