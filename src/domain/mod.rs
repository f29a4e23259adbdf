//! Domain models and types for Podex.
//!
//! The domain layer provides:
//! - **Entities** ([`Organization`], [`Space`], [`Application`], [`FileDescriptor`])
//!   wrapped in a [`Record`] that keeps the raw remote JSON for persistence
//! - **Error types** ([`PodexError`])
//! - **Result type alias** ([`Result`])
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, PodexError>`]:
//!
//! ```rust
//! use podex::domain::{PodexError, Result};
//!
//! fn example() -> Result<()> {
//!     let config = podex::config::load_config("podex.toml")?;
//!     Ok(())
//! }
//! ```

pub mod entities;
pub mod errors;
pub mod result;

pub use entities::{Application, FileDescriptor, Named, Organization, Record, Space};
pub use errors::PodexError;
pub use result::Result;
