//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{NameCollisionPolicy, PodexConfig};
use crate::config::secret_string;
use crate::domain::errors::PodexError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into PodexConfig
/// 4. Applies environment variable overrides (PODEX_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns [`PodexError::Configuration`] if the file is missing or unreadable,
/// a referenced variable is unset, parsing fails or validation fails.
///
/// # Examples
///
/// ```no_run
/// use podex::config::loader::load_config;
///
/// let config = load_config("podex.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<PodexConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(PodexError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        PodexError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    parse_config(&contents)
}

/// Parses, overrides and validates configuration from TOML text
pub fn parse_config(contents: &str) -> Result<PodexConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: PodexConfig = toml::from_str(&contents)
        .map_err(|e| PodexError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        PodexError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left untouched.
///
/// # Errors
///
/// Returns an error listing every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| PodexError::Configuration(e.to_string()))?;
    let mut result = String::new();
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    processed_line = processed_line.replace(&format!("${{{var_name}}}"), &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(PodexError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides using the PODEX_* prefix
///
/// Variables follow the pattern PODEX_<SECTION>_<KEY>, for example
/// PODEX_EXPORT_RATE_LIMIT_PER_HOUR or PODEX_PLATFORM_PASSWORD.
fn apply_env_overrides(config: &mut PodexConfig) -> Result<()> {
    if let Ok(val) = std::env::var("PODEX_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Platform overrides
    if let Ok(val) = std::env::var("PODEX_PLATFORM_BASE_URL") {
        config.platform.base_url = val;
    }
    if let Ok(val) = std::env::var("PODEX_PLATFORM_CLIENT_ID") {
        config.platform.client_id = val;
    }
    if let Ok(val) = std::env::var("PODEX_PLATFORM_CLIENT_SECRET") {
        config.platform.client_secret = secret_string(val);
    }
    if let Ok(val) = std::env::var("PODEX_PLATFORM_USERNAME") {
        config.platform.username = val;
    }
    if let Ok(val) = std::env::var("PODEX_PLATFORM_PASSWORD") {
        config.platform.password = secret_string(val);
    }
    if let Ok(val) = std::env::var("PODEX_PLATFORM_TIMEOUT_SECONDS") {
        config.platform.timeout_seconds = parse_override("PODEX_PLATFORM_TIMEOUT_SECONDS", &val)?;
    }

    // Export overrides
    if let Ok(val) = std::env::var("PODEX_EXPORT_OUTPUT_DIR") {
        config.export.output_dir = val;
    }
    if let Ok(val) = std::env::var("PODEX_EXPORT_RATE_LIMIT_PER_HOUR") {
        config.export.rate_limit_per_hour =
            parse_override("PODEX_EXPORT_RATE_LIMIT_PER_HOUR", &val)?;
    }
    if let Ok(val) = std::env::var("PODEX_EXPORT_MAX_CONCURRENCY") {
        config.export.max_concurrency = parse_override("PODEX_EXPORT_MAX_CONCURRENCY", &val)?;
    }
    if let Ok(val) = std::env::var("PODEX_EXPORT_DOWNLOAD_FILES") {
        config.export.download_files = parse_override("PODEX_EXPORT_DOWNLOAD_FILES", &val)?;
    }
    if let Ok(val) = std::env::var("PODEX_EXPORT_NAME_COLLISION") {
        config.export.name_collision = match val.to_lowercase().as_str() {
            "suffix" => NameCollisionPolicy::Suffix,
            "error" => NameCollisionPolicy::Error,
            other => {
                return Err(PodexError::Configuration(format!(
                    "PODEX_EXPORT_NAME_COLLISION must be 'suffix' or 'error', got '{other}'"
                )))
            }
        };
    }

    // Logging overrides
    if let Ok(val) = std::env::var("PODEX_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = parse_override("PODEX_LOGGING_LOCAL_ENABLED", &val)?;
    }
    if let Ok(val) = std::env::var("PODEX_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }

    Ok(())
}

fn parse_override<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e| {
        PodexError::Configuration(format!("Invalid value '{raw}' for {name}: {e}"))
    })
}
