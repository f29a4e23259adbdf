//! Logging and observability
//!
//! Structured logging via `tracing`, with an optional rotating JSON file layer.
//!
//! ```no_run
//! use podex::logging::init_logging;
//! use podex::config::LoggingConfig;
//!
//! let _guard = init_logging("info", &LoggingConfig::default()).expect("logging");
//! tracing::info!("Application started");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log the start of an export for an account
///
/// ```no_run
/// use podex::log_export_start;
///
/// log_export_start!("alice@example.com", "podio-export/alice_at_example.com");
/// ```
#[macro_export]
macro_rules! log_export_start {
    ($account:expr, $root:expr) => {
        tracing::info!(
            account = %$account,
            root = %$root,
            "Starting export"
        );
    };
}

/// Log a finished paginated collection
///
/// ```no_run
/// use podex::log_collection_complete;
///
/// log_collection_complete!("tasks", "Acme", 240);
/// ```
#[macro_export]
macro_rules! log_collection_complete {
    ($kind:expr, $owner:expr, $count:expr) => {
        tracing::debug!(
            kind = $kind,
            owner = %$owner,
            count = $count,
            "Collection exported"
        );
    };
}
