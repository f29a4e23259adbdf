//! Local filesystem sink for exported data

use crate::domain::{PodexError, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};

/// Writes the export tree under a root directory
#[derive(Debug, Clone)]
pub struct FsSink {
    root: PathBuf,
}

impl FsSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create `dir` and all missing parents
    pub async fn ensure_dir(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)
            .await
            .map_err(|e| PodexError::persistence(dir, e))
    }

    /// Write `value` as pretty JSON to `dir/file_name`, creating `dir` first
    pub async fn write_json<T: Serialize + ?Sized>(
        &self,
        dir: &Path,
        file_name: &str,
        value: &T,
    ) -> Result<PathBuf> {
        self.ensure_dir(dir).await?;
        let path = dir.join(file_name);
        let body = serde_json::to_vec_pretty(value)?;
        fs::write(&path, body)
            .await
            .map_err(|e| PodexError::persistence(&path, e))?;

        tracing::info!(path = %self.display(&path), "Exported");
        Ok(path)
    }

    /// Create (or truncate) a file for streaming into
    pub async fn create_file(&self, path: &Path) -> Result<File> {
        File::create(path)
            .await
            .map_err(|e| PodexError::persistence(path, e))
    }

    /// Delete a file; a file that is already gone is not an error
    pub async fn remove_file(&self, path: &Path) -> Result<()> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PodexError::persistence(path, e)),
        }
    }

    /// `path` relative to the sink root, for log lines
    pub fn display(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .display()
            .to_string()
    }
}
