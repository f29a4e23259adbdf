//! Concurrent file downloads
//!
//! Each file is streamed to `<target>/<file_id>.<ext>`. Every file of a batch
//! is attempted even when one fails; the batch reports the first failure once
//! all downloads have settled. Stream faults whose kind is listed in the
//! [`WarningPolicy`] are logged and the stream keeps being read.

use crate::adapters::platform::{ByteStream, PlatformApi, StreamFault};
use crate::adapters::storage::FsSink;
use crate::core::export::naming::extension_for;
use crate::core::export::summary::Counter;
use crate::domain::{FileDescriptor, PodexError, Result};
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

/// Stream fault kinds that are only worth a warning
#[derive(Debug, Clone, Default)]
pub struct WarningPolicy {
    kinds: HashSet<String>,
}

impl WarningPolicy {
    pub fn new<I, S>(kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kinds: kinds.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_warning(&self, fault: &StreamFault) -> bool {
        self.kinds.contains(&fault.kind)
    }
}

pub struct FileDownloader {
    api: Arc<dyn PlatformApi>,
    sink: FsSink,
    max_concurrency: usize,
    policy: WarningPolicy,
}

impl FileDownloader {
    pub fn new(
        api: Arc<dyn PlatformApi>,
        sink: FsSink,
        max_concurrency: usize,
        policy: WarningPolicy,
    ) -> Self {
        Self {
            api,
            sink,
            max_concurrency: max_concurrency.max(1),
            policy,
        }
    }

    /// Download a batch of files into `target_dir`
    ///
    /// `downloaded` is advanced once per file that finished cleanly. Returns
    /// the number of files this batch downloaded.
    pub async fn download_all(
        &self,
        files: &[FileDescriptor],
        target_dir: &Path,
        downloaded: &Counter,
    ) -> Result<u64> {
        if files.is_empty() {
            return Ok(0);
        }
        self.sink.ensure_dir(target_dir).await?;

        let results: Vec<Result<PathBuf>> = stream::iter(files)
            .map(|file| self.download_one(file, target_dir))
            .buffer_unordered(self.max_concurrency)
            .collect()
            .await;

        let mut count = 0;
        let mut first_error = None;
        for result in results {
            match result {
                Ok(_) => count += 1,
                Err(error) => {
                    tracing::warn!(error = %error, "File download failed");
                    first_error.get_or_insert(error);
                }
            }
        }

        downloaded.add(count);
        match first_error {
            Some(error) => Err(error),
            None => Ok(count),
        }
    }

    async fn download_one(&self, file: &FileDescriptor, target_dir: &Path) -> Result<PathBuf> {
        let path = target_dir.join(format!("{}.{}", file.file_id, extension_for(&file.mimetype)));

        let body = self
            .api
            .open_download(&file.link)
            .await
            .map_err(|e| PodexError::Download {
                file_id: file.file_id,
                message: e.to_string(),
            })?;
        let mut out = self.sink.create_file(&path).await?;

        let copied = self.copy_body(file, body, &mut out, &path).await;
        drop(out);
        if let Err(error) = copied {
            if let Err(cleanup) = self.sink.remove_file(&path).await {
                tracing::warn!(file_id = file.file_id, error = %cleanup, "Partial file left behind");
            }
            return Err(error);
        }

        tracing::info!(file_id = file.file_id, path = %self.sink.display(&path), "Downloaded");
        Ok(path)
    }

    async fn copy_body(
        &self,
        file: &FileDescriptor,
        mut body: ByteStream,
        out: &mut File,
        path: &Path,
    ) -> Result<()> {
        while let Some(chunk) = body.next().await {
            match chunk {
                Ok(bytes) => out
                    .write_all(&bytes)
                    .await
                    .map_err(|e| PodexError::persistence(path, e))?,
                Err(fault) if self.policy.is_warning(&fault) => {
                    tracing::warn!(
                        file_id = file.file_id,
                        kind = %fault.kind,
                        "Ignoring stream fault: {}",
                        fault.message
                    );
                }
                Err(fault) => {
                    return Err(PodexError::Download {
                        file_id: file.file_id,
                        message: fault.to_string(),
                    })
                }
            }
        }

        out.flush()
            .await
            .map_err(|e| PodexError::persistence(path, e))
    }
}
