//! Configuration schema types
//!
//! This module defines the configuration structure for Podex.

use crate::config::SecretString;
use serde::{Deserialize, Serialize};

/// What to do when two siblings derive the same directory name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NameCollisionPolicy {
    /// Append ` (2)`, ` (3)`, ... to later siblings
    #[default]
    Suffix,
    /// Fail the parent node
    Error,
}

/// Main Podex configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PodexConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Platform API connection and credentials
    pub platform: PlatformConfig,

    /// Export settings
    #[serde(default)]
    pub export: ExportConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl PodexConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.platform.validate()?;
        self.export.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Platform API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Base URL of the API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Authentication flow (server, client, password)
    #[serde(default = "default_auth_type")]
    pub auth_type: String,

    /// OAuth client ID
    pub client_id: String,

    /// OAuth client secret
    pub client_secret: SecretString,

    /// Account username, also used to name the export root
    pub username: String,

    /// Account password
    /// Stored securely in memory and automatically zeroized on drop
    pub password: SecretString,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl PlatformConfig {
    fn validate(&self) -> Result<(), String> {
        use secrecy::ExposeSecret;

        if self.base_url.is_empty() {
            return Err("platform.base_url cannot be empty".to_string());
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err("platform.base_url must start with http:// or https://".to_string());
        }

        // Only the password flow is wired up; the others exist as session keys
        if self.auth_type != "password" {
            return Err(format!(
                "Invalid auth_type '{}'. Only 'password' is supported",
                self.auth_type
            ));
        }

        if self.client_id.is_empty() {
            return Err("platform.client_id cannot be empty".to_string());
        }
        if self.client_secret.expose_secret().is_empty() {
            return Err("platform.client_secret cannot be empty".to_string());
        }
        if self.username.is_empty() {
            return Err("platform.username cannot be empty".to_string());
        }
        if self.password.expose_secret().is_empty() {
            return Err("platform.password cannot be empty".to_string());
        }

        if self.timeout_seconds == 0 {
            return Err("platform.timeout_seconds must be > 0".to_string());
        }

        Ok(())
    }
}

/// Export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Directory the export tree is written under
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Global ceiling on API calls per rolling hour
    #[serde(default = "default_rate_limit_per_hour")]
    pub rate_limit_per_hour: u32,

    /// Maximum in-flight siblings at each fan-out point
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Download file attachments into each application's `files/` directory
    #[serde(default = "default_true")]
    pub download_files: bool,

    /// Also export items as spreadsheets. Accepted but not implemented.
    #[serde(default)]
    pub download_xlsx: bool,

    /// Items requested per page (fan-out pagination)
    #[serde(default = "default_item_page_size")]
    pub item_page_size: u64,

    /// Tasks requested per page
    #[serde(default = "default_task_page_size")]
    pub task_page_size: u64,

    /// File descriptors requested per page
    #[serde(default = "default_file_page_size")]
    pub file_page_size: u64,

    /// Contacts requested per page
    #[serde(default = "default_contact_page_size")]
    pub contact_page_size: u64,

    /// Sibling directory-name collision handling
    #[serde(default)]
    pub name_collision: NameCollisionPolicy,

    /// Stream fault kinds that are logged and ignored while downloading
    #[serde(default)]
    pub transport_warning_kinds: Vec<String>,
}

impl ExportConfig {
    fn validate(&self) -> Result<(), String> {
        if self.output_dir.is_empty() {
            return Err("export.output_dir cannot be empty".to_string());
        }

        if self.rate_limit_per_hour == 0 {
            return Err("export.rate_limit_per_hour must be > 0".to_string());
        }

        if self.max_concurrency == 0 || self.max_concurrency > 100 {
            return Err(format!(
                "export.max_concurrency must be between 1 and 100, got {}",
                self.max_concurrency
            ));
        }

        for (key, size) in [
            ("item_page_size", self.item_page_size),
            ("task_page_size", self.task_page_size),
            ("file_page_size", self.file_page_size),
            ("contact_page_size", self.contact_page_size),
        ] {
            if !(1..=500).contains(&size) {
                return Err(format!(
                    "export.{key} must be between 1 and 500, got {size}"
                ));
            }
        }

        Ok(())
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            rate_limit_per_hour: default_rate_limit_per_hour(),
            max_concurrency: default_max_concurrency(),
            download_files: true,
            download_xlsx: false,
            item_page_size: default_item_page_size(),
            task_page_size: default_task_page_size(),
            file_page_size: default_file_page_size(),
            contact_page_size: default_contact_page_size(),
            name_collision: NameCollisionPolicy::default(),
            transport_warning_kinds: Vec::new(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable JSON file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Directory for log files
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Rotation strategy (daily, hourly)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_enabled && self.local_path.is_empty() {
            return Err("logging.local_path cannot be empty when file logging is on".to_string());
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_base_url() -> String {
    "https://api.podio.com".to_string()
}

fn default_auth_type() -> String {
    "password".to_string()
}

fn default_true() -> bool {
    true
}

fn default_timeout_seconds() -> u64 {
    60
}

fn default_output_dir() -> String {
    "podio-export".to_string()
}

fn default_rate_limit_per_hour() -> u32 {
    1000
}

fn default_max_concurrency() -> usize {
    5
}

fn default_item_page_size() -> u64 {
    500
}

fn default_task_page_size() -> u64 {
    100
}

fn default_file_page_size() -> u64 {
    100
}

fn default_contact_page_size() -> u64 {
    500
}

fn default_local_path() -> String {
    "logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
