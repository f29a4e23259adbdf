//! Paginated collection
//!
//! Two strategies are used against the platform:
//!
//! - **short page**: request sequential offsets until a page comes back with
//!   fewer records than the page size. Used for tasks, files and contacts.
//! - **fan-out**: request the first page, read the reported total, then
//!   request every remaining offset concurrently. Used for items. Each later
//!   page must report the same total as the first; a different value means
//!   the collection changed underneath the export.

use crate::core::export::fanout::{for_each_bounded, ErrorScope};
use crate::core::export::summary::CollectionTally;
use crate::domain::entities::kind_of;
use crate::domain::{PodexError, Result};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

/// One page of a collection as returned by the platform
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// Response body, persisted verbatim
    pub body: Value,
    /// Number of records on this page
    pub count: u64,
    /// Server-reported size of the whole collection, when the endpoint has one
    pub total: Option<u64>,
}

impl Page {
    /// Page whose body is a bare JSON array of records
    pub fn from_array(body: Value) -> Result<Self> {
        let count = match &body {
            Value::Array(records) => records.len() as u64,
            other => {
                return Err(PodexError::InvalidResponse(format!(
                    "Expected a page array, got {}",
                    kind_of(other)
                )))
            }
        };
        Ok(Self {
            body,
            count,
            total: None,
        })
    }

    /// Page whose body is an object holding the records under `records_key`
    /// and the collection size under `total`
    pub fn from_envelope(body: Value, records_key: &str) -> Result<Self> {
        let count = body
            .get(records_key)
            .and_then(Value::as_array)
            .map(|records| records.len() as u64)
            .ok_or_else(|| {
                PodexError::InvalidResponse(format!("Page has no '{records_key}' array"))
            })?;
        let total = body
            .get("total")
            .and_then(Value::as_u64)
            .ok_or_else(|| PodexError::InvalidResponse("Page has no 'total'".to_string()))?;
        Ok(Self {
            body,
            count,
            total: Some(total),
        })
    }
}

/// Fetch sequential pages until one is shorter than `page_size`
///
/// `fetch` is called with each offset; `persist` receives every non-empty
/// page with its offset. Returns the number of records observed.
pub async fn collect_short_pages<F, FFut, P, PFut>(
    page_size: u64,
    scope: &ErrorScope,
    tally: &CollectionTally,
    mut fetch: F,
    mut persist: P,
) -> Result<u64>
where
    F: FnMut(u64) -> FFut,
    FFut: Future<Output = Result<Page>>,
    P: FnMut(u64, Page) -> PFut,
    PFut: Future<Output = Result<()>>,
{
    let page_size = page_size.max(1);
    let mut offset = 0;

    loop {
        if scope.has_failed() {
            tracing::debug!(offset, "Collection stopped after failure elsewhere");
            break;
        }

        let page = fetch(offset).await?;
        let count = page.count;
        tracing::debug!(offset, count, "Fetched page");

        tally.add_observed(count);
        if count > 0 {
            persist(offset, page).await?;
        }
        if count < page_size {
            break;
        }
        offset += page_size;
    }

    Ok(tally.observed())
}

/// Fetch the first page, then every remaining offset concurrently
///
/// Later offsets start at the length of the first page and step by
/// `page_size` up to the first page's total. A page reporting a different
/// total fails the collection with [`PodexError::ConcurrentMutation`] and is
/// not persisted. `label` names the collection in that error.
pub async fn collect_fan_out<F, FFut, P, PFut>(
    label: &str,
    page_size: u64,
    max_concurrency: usize,
    scope: &Arc<ErrorScope>,
    tally: &CollectionTally,
    fetch: F,
    persist: P,
) -> Result<u64>
where
    F: Fn(u64) -> FFut,
    FFut: Future<Output = Result<Page>>,
    P: Fn(u64, Page) -> PFut,
    PFut: Future<Output = Result<()>>,
{
    let first = fetch(0).await?;
    let total = first.total.ok_or_else(|| {
        PodexError::InvalidResponse(format!("First page of {label} has no total"))
    })?;
    let first_count = first.count;
    tally.set_total(total);
    tally.add_observed(first_count);
    tracing::debug!(collection = label, total, count = first_count, "Fetched first page");

    if first_count == 0 {
        return Ok(tally.observed());
    }
    persist(0, first).await?;

    let offsets = (first_count..total).step_by(page_size.max(1) as usize);
    let local = scope.child();
    let (fetch, persist) = (&fetch, &persist);

    for_each_bounded(offsets, max_concurrency, &local, |offset| {
        let local = &local;
        async move {
            let result = async {
                let page = fetch(offset).await?;
                let reported = page.total.unwrap_or_default();
                if reported != total {
                    return Err(PodexError::ConcurrentMutation {
                        collection: label.to_string(),
                        expected: total,
                        actual: reported,
                    });
                }
                tally.add_observed(page.count);
                tracing::debug!(collection = label, offset, count = page.count, "Fetched page");
                if page.count > 0 {
                    persist(offset, page).await?;
                }
                Ok(())
            }
            .await;

            if let Err(error) = result {
                local.record(error);
            }
        }
    })
    .await;

    local.result()?;
    Ok(tally.observed())
}
