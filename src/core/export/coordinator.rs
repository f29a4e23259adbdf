//! Export coordinator - main orchestrator for the export process
//!
//! Builds the rate-limited platform client, runs the tree walk for the
//! configured account, validates the summary and writes `summary.json`.

use crate::adapters::platform::{
    HttpPlatformClient, MemorySessionStore, PlatformApi, RateLimitedApi, SessionStore,
};
use crate::adapters::storage::FsSink;
use crate::config::PodexConfig;
use crate::core::export::naming;
use crate::core::export::summary::{ExportReport, SummaryNode, SUMMARY_FILE};
use crate::core::export::tree::{ExportSettings, TreeExporter};
use crate::core::rate_limit::RateLimiter;
use crate::core::verification::SummaryValidator;
use crate::domain::{PodexError, Result};
use crate::log_export_start;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Export coordinator
pub struct ExportCoordinator {
    config: PodexConfig,
    api: Arc<dyn PlatformApi>,
}

impl ExportCoordinator {
    /// Authenticate against the platform and prepare the export
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an unusable HTTP setup, or an
    /// authentication error when the password flow is rejected.
    pub async fn new(config: PodexConfig) -> Result<Self> {
        Self::with_sessions(config, Arc::new(MemorySessionStore::new())).await
    }

    /// Like [`Self::new`], reusing credentials already held by `sessions`
    pub async fn with_sessions(
        config: PodexConfig,
        sessions: Arc<dyn SessionStore>,
    ) -> Result<Self> {
        let client = HttpPlatformClient::new(config.platform.clone(), sessions)?;
        let limiter = Arc::new(RateLimiter::per_hour(config.export.rate_limit_per_hour));

        if !client.is_authenticated() {
            limiter.acquire().await;
        }
        client.ensure_authenticated().await?;

        let api = Arc::new(RateLimitedApi::new(Arc::new(client), limiter));
        Ok(Self::with_api(config, api))
    }

    /// Use an already prepared platform API
    pub fn with_api(config: PodexConfig, api: Arc<dyn PlatformApi>) -> Self {
        Self { config, api }
    }

    /// Directory the account is exported into
    pub fn account_dir(&self) -> PathBuf {
        PathBuf::from(&self.config.export.output_dir)
            .join(naming::account_dir(&self.config.platform.username))
    }

    /// Execute the export
    ///
    /// Walk and validation failures do not make this return `Err`; they are
    /// reported in [`ExportReport::error`] next to the partial summary, which
    /// is written to disk either way.
    ///
    /// # Errors
    ///
    /// Returns an error when the configuration is invalid or the account
    /// directory cannot be created.
    pub async fn execute_export(&self) -> Result<ExportReport> {
        let start_time = Instant::now();

        self.config.validate().map_err(PodexError::Configuration)?;
        if self.config.export.download_xlsx {
            tracing::warn!("export.download_xlsx is not supported and will be ignored");
        }

        let account = naming::account_dir(&self.config.platform.username);
        let root = self.account_dir();
        let sink = FsSink::new(&root);
        sink.ensure_dir(&root).await?;

        log_export_start!(self.config.platform.username, root.display());

        let exporter = TreeExporter::new(
            Arc::clone(&self.api),
            sink.clone(),
            ExportSettings::from(&self.config.export),
        );
        let walk = exporter.export_account(&root).await;

        let mut summary = SummaryNode::new();
        summary.insert_child(account, walk.summary);

        let mut error = match walk.error {
            Some(error) => Some(error),
            None => {
                let validator = SummaryValidator::for_export(self.config.export.download_files);
                match validator.validate(&summary) {
                    Ok(()) => {
                        tracing::info!("Summary counts are consistent");
                        None
                    }
                    Err(e) => Some(e),
                }
            }
        };

        let summary_path = match sink.write_json(&root, SUMMARY_FILE, &summary).await {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::error!(error = %e, "Failed to write summary");
                error.get_or_insert(e);
                None
            }
        };

        let report = ExportReport {
            summary,
            summary_path,
            error,
            duration: start_time.elapsed(),
        };
        report.log_summary();

        Ok(report)
    }
}
