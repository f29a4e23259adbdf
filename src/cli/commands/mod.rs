//! CLI command implementations
//!
//! This module contains all CLI command implementations.

pub mod check_summary;
pub mod export;
pub mod validate;
