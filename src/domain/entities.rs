//! Platform entities
//!
//! Only the fields needed to walk the hierarchy are decoded; the full remote
//! record is kept as raw JSON and persisted verbatim.

use crate::domain::{PodexError, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

/// An organization the account is a member of
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Organization {
    pub org_id: u64,
    pub name: String,
}

/// A workspace inside an organization
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Space {
    pub space_id: u64,
    pub name: String,
}

/// Application configuration block; only the name is used
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AppConfig {
    pub name: String,
}

/// An application inside a space
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Application {
    pub app_id: u64,
    pub config: AppConfig,
}

impl Application {
    pub fn name(&self) -> &str {
        &self.config.name
    }
}

/// A file attached somewhere inside an application
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FileDescriptor {
    pub file_id: u64,
    #[serde(default)]
    pub mimetype: String,
    pub link: String,
}

/// Anything that has a display name usable as a directory name
pub trait Named {
    fn display_name(&self) -> &str;
}

impl Named for Organization {
    fn display_name(&self) -> &str {
        &self.name
    }
}

impl Named for Space {
    fn display_name(&self) -> &str {
        &self.name
    }
}

impl Named for Application {
    fn display_name(&self) -> &str {
        self.name()
    }
}

/// A decoded entity together with the raw record it came from
#[derive(Debug, Clone)]
pub struct Record<T> {
    pub entity: T,
    pub raw: Value,
}

impl<T: DeserializeOwned> Record<T> {
    /// Decodes `raw` while keeping it for persistence
    pub fn from_value(raw: Value) -> Result<Self> {
        let entity = T::deserialize(&raw).map_err(|e| {
            PodexError::InvalidResponse(format!(
                "Unexpected {} record: {e}",
                std::any::type_name::<T>().rsplit("::").next().unwrap_or("entity")
            ))
        })?;
        Ok(Self { entity, raw })
    }

    /// Decodes every element of a JSON array response
    pub fn list(value: Value) -> Result<Vec<Self>> {
        match value {
            Value::Array(values) => values.into_iter().map(Self::from_value).collect(),
            other => Err(PodexError::InvalidResponse(format!(
                "Expected a JSON array, got {}",
                kind_of(&other)
            ))),
        }
    }
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
