//! Output storage

pub mod fs;

pub use fs::FsSink;
