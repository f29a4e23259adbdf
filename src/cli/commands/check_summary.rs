//! Check summary command implementation
//!
//! Re-runs the count validation over a `summary.json` written by a previous
//! export, without contacting the platform.

use crate::core::export::SummaryNode;
use crate::core::verification::SummaryValidator;
use crate::domain::Result;
use clap::Args;
use std::path::Path;

/// Arguments for the check-summary command
#[derive(Args, Debug)]
pub struct CheckSummaryArgs {
    /// Path to a summary.json
    pub path: String,

    /// The export ran without downloading files; skip the file counts
    #[arg(long)]
    pub no_files: bool,
}

impl CheckSummaryArgs {
    /// Execute the check-summary command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(path = %self.path, "Checking summary");

        let summary = match read_summary(Path::new(&self.path)).await {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Failed to read summary: {e}");
                return Ok(5);
            }
        };

        match SummaryValidator::for_export(!self.no_files).validate(&summary) {
            Ok(()) => {
                println!("✅ All counts match");
                Ok(0)
            }
            Err(e) => {
                println!("❌ {e}");
                Ok(1)
            }
        }
    }
}

async fn read_summary(path: &Path) -> Result<SummaryNode> {
    let body = tokio::fs::read(path).await?;
    let value: serde_json::Value = serde_json::from_slice(&body)?;
    SummaryNode::from_json(&value)
}
