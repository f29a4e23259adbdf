//! Export summary tree and reporting
//!
//! The summary mirrors the exported hierarchy: every node has a map of named
//! counters and a map of named children. It serializes to a single nested
//! JSON object (counters first, then children) and can be read back from one.

use crate::domain::{PodexError, Result};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::Duration;

/// Items seen across all pages of an application
pub const OBSERVED_ITEM_COUNT: &str = "observed_item_count";
/// Item total the server reported on the first page
pub const SERVER_REPORTED_TOTAL: &str = "server_reported_total";
/// File descriptors listed for an application
pub const DISCOVERED_FILE_COUNT: &str = "discovered_file_count";
/// Files fully written to disk
pub const DOWNLOADED_FILE_COUNT: &str = "downloaded_file_count";
/// Tasks exported for an organization
pub const OBSERVED_TASK_COUNT: &str = "observed_task_count";
/// Contacts exported for the account
pub const OBSERVED_CONTACT_COUNT: &str = "observed_contact_count";

/// Every counter key; child names must avoid these
pub const COUNTER_KEYS: [&str; 6] = [
    OBSERVED_ITEM_COUNT,
    SERVER_REPORTED_TOTAL,
    DISCOVERED_FILE_COUNT,
    DOWNLOADED_FILE_COUNT,
    OBSERVED_TASK_COUNT,
    OBSERVED_CONTACT_COUNT,
];

/// Name of the summary written at the account root
pub const SUMMARY_FILE: &str = "summary.json";

/// One node of the summary tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummaryNode {
    counters: BTreeMap<String, u64>,
    children: BTreeMap<String, SummaryNode>,
}

impl SummaryNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_counter(mut self, key: &str, value: u64) -> Self {
        self.set_counter(key, value);
        self
    }

    pub fn set_counter(&mut self, key: &str, value: u64) {
        self.counters.insert(key.to_string(), value);
    }

    pub fn counter(&self, key: &str) -> Option<u64> {
        self.counters.get(key).copied()
    }

    pub fn counters(&self) -> &BTreeMap<String, u64> {
        &self.counters
    }

    pub fn insert_child(&mut self, name: impl Into<String>, child: SummaryNode) {
        self.children.insert(name.into(), child);
    }

    pub fn child(&self, name: &str) -> Option<&SummaryNode> {
        self.children.get(name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut SummaryNode> {
        self.children.get_mut(name)
    }

    pub fn children(&self) -> &BTreeMap<String, SummaryNode> {
        &self.children
    }

    /// Follow a slash-separated path of child names
    pub fn find(&self, path: &str) -> Option<&SummaryNode> {
        path.split('/')
            .filter(|s| !s.is_empty())
            .try_fold(self, |node, name| node.child(name))
    }

    /// Read a summary back from its JSON form
    ///
    /// Unsigned integers become counters and objects become children; any
    /// other value is rejected.
    pub fn from_json(value: &Value) -> Result<Self> {
        let Value::Object(map) = value else {
            return Err(PodexError::Serialization(
                "summary node must be a JSON object".to_string(),
            ));
        };

        let mut node = SummaryNode::new();
        for (key, value) in map {
            match value {
                Value::Number(n) => {
                    let n = n.as_u64().ok_or_else(|| {
                        PodexError::Serialization(format!("counter '{key}' is not a count"))
                    })?;
                    node.set_counter(key, n);
                }
                Value::Object(_) => node.insert_child(key.clone(), Self::from_json(value)?),
                _ => {
                    return Err(PodexError::Serialization(format!(
                        "unexpected value under '{key}' in summary"
                    )))
                }
            }
        }
        Ok(node)
    }
}

impl Serialize for SummaryNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.counters.len() + self.children.len()))?;
        for (key, value) in &self.counters {
            map.serialize_entry(key, value)?;
        }
        for (name, child) in &self.children {
            map.serialize_entry(name, child)?;
        }
        map.end()
    }
}

/// Running count owned by exactly one export branch
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn add(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Progress of one paginated collection
#[derive(Debug, Default)]
pub struct CollectionTally {
    observed: Counter,
    total: OnceLock<u64>,
}

impl CollectionTally {
    pub fn add_observed(&self, n: u64) {
        self.observed.add(n);
    }

    pub fn observed(&self) -> u64 {
        self.observed.get()
    }

    /// Record the server-reported total; only the first value is kept
    pub fn set_total(&self, total: u64) {
        let _ = self.total.set(total);
    }

    pub fn total(&self) -> Option<u64> {
        self.total.get().copied()
    }
}

/// Result of one export run
#[derive(Debug, Clone)]
pub struct ExportReport {
    /// Summary tree, keyed by account at the top
    pub summary: SummaryNode,

    /// Where `summary.json` was written, if it could be written
    pub summary_path: Option<PathBuf>,

    /// First error of the walk, or the validation failure
    pub error: Option<PodexError>,

    pub duration: Duration,
}

impl ExportReport {
    pub fn is_successful(&self) -> bool {
        self.error.is_none()
    }

    /// Log the outcome
    pub fn log_summary(&self) {
        let (apps, items, files) = totals(&self.summary);
        tracing::info!(
            applications = apps,
            items,
            downloaded_files = files,
            duration_secs = self.duration.as_secs(),
            summary = ?self.summary_path,
            "Export finished"
        );

        if let Some(error) = &self.error {
            tracing::error!(error = %error, "Export failed");
        }
    }
}

fn totals(node: &SummaryNode) -> (u64, u64, u64) {
    let own = match node.counter(OBSERVED_ITEM_COUNT) {
        Some(items) => (1, items, node.counter(DOWNLOADED_FILE_COUNT).unwrap_or(0)),
        None => (0, 0, 0),
    };
    node.children().values().map(totals).fold(own, |acc, t| {
        (acc.0 + t.0, acc.1 + t.1, acc.2 + t.2)
    })
}
