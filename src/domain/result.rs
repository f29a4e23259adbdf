//! Result type alias for Podex

use super::errors::PodexError;

/// Result type alias for Podex operations
///
/// # Examples
///
/// ```
/// use podex::domain::result::Result;
/// use podex::domain::errors::PodexError;
///
/// fn failing_function() -> Result<()> {
///     Err(PodexError::Network("connection reset".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, PodexError>;
