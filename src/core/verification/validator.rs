//! Post-export count validation
//!
//! Walks the summary tree and compares pairs of counters wherever a node
//! carries them. Nodes with neither counter of a pair are only containers and
//! are descended into; a node that has at least one of them is compared and
//! its children are not inspected for that pair.

use crate::core::export::summary::{
    SummaryNode, DISCOVERED_FILE_COUNT, DOWNLOADED_FILE_COUNT, OBSERVED_ITEM_COUNT,
    SERVER_REPORTED_TOTAL,
};
use crate::domain::{PodexError, Result};

/// Items seen must match the server-reported total
pub const ITEM_PAIR: (&str, &str) = (OBSERVED_ITEM_COUNT, SERVER_REPORTED_TOTAL);

/// Files listed must match files downloaded
pub const FILE_PAIR: (&str, &str) = (DISCOVERED_FILE_COUNT, DOWNLOADED_FILE_COUNT);

/// Counter pairs checked after an export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryValidator {
    pairs: Vec<(String, String)>,
}

impl SummaryValidator {
    pub fn new<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            pairs: pairs
                .into_iter()
                .map(|(a, b)| (a.to_string(), b.to_string()))
                .collect(),
        }
    }

    /// Pairs for an export run; the file pair only applies when files were
    /// downloaded
    pub fn for_export(download_files: bool) -> Self {
        if download_files {
            Self::new([ITEM_PAIR, FILE_PAIR])
        } else {
            Self::new([ITEM_PAIR])
        }
    }

    /// Check every pair over the whole tree, in order
    pub fn validate(&self, tree: &SummaryNode) -> Result<()> {
        for (field_a, field_b) in &self.pairs {
            check(tree, field_a, field_b, &mut Vec::new())?;
        }
        Ok(())
    }
}

/// Check `pairs` over `tree`; see [`SummaryValidator`]
pub fn validate(tree: &SummaryNode, pairs: &[(&str, &str)]) -> Result<()> {
    SummaryValidator::new(pairs.iter().copied()).validate(tree)
}

fn check<'a>(
    node: &'a SummaryNode,
    field_a: &str,
    field_b: &str,
    path: &mut Vec<&'a str>,
) -> Result<()> {
    let left = node.counter(field_a);
    let right = node.counter(field_b);

    if left.is_none() && right.is_none() {
        for (name, child) in node.children() {
            path.push(name);
            check(child, field_a, field_b, path)?;
            path.pop();
        }
        return Ok(());
    }

    if left != right {
        return Err(PodexError::Validation {
            path: path.join("/"),
            field_a: field_a.to_string(),
            field_b: field_b.to_string(),
            left: describe(left),
            right: describe(right),
        });
    }
    Ok(())
}

fn describe(value: Option<u64>) -> String {
    value.map_or_else(|| "missing".to_string(), |v| v.to_string())
}
