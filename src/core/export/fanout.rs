//! Failure scopes and bounded fan-out
//!
//! Every node of the export walk owns an [`ErrorScope`] linked to its parent.
//! Recording an error marks the node and all of its ancestors at once, so a
//! failure deep in one application is visible at the account level
//! immediately. New work is only scheduled while no scope on the path to the
//! root has failed; work that is already running always finishes.

use crate::domain::{PodexError, Result};
use futures::stream::{FuturesUnordered, StreamExt};
use std::future::Future;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
pub struct ErrorScope {
    first: Mutex<Option<PodexError>>,
    parent: Option<Arc<ErrorScope>>,
}

impl ErrorScope {
    /// Scope of a whole export run
    pub fn root() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn child(self: &Arc<Self>) -> Arc<Self> {
        Arc::new(Self {
            first: Mutex::new(None),
            parent: Some(Arc::clone(self)),
        })
    }

    /// Record `error` here and on every ancestor that has no error yet
    pub fn record(&self, error: PodexError) {
        let mut scope = Some(self);
        while let Some(current) = scope {
            {
                let mut first = current.first.lock().unwrap_or_else(|e| e.into_inner());
                if first.is_none() {
                    *first = Some(error.clone());
                }
            }
            scope = current.parent.as_deref();
        }
    }

    /// Keep the value of `result`, recording its error instead
    pub fn observe<T>(&self, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                self.record(error);
                None
            }
        }
    }

    /// True when this scope or any ancestor has recorded an error
    pub fn has_failed(&self) -> bool {
        self.first_error().is_some()
            || self.parent.as_deref().is_some_and(ErrorScope::has_failed)
    }

    /// First error recorded in this scope's own subtree
    pub fn first_error(&self) -> Option<PodexError> {
        self.first.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn result(&self) -> Result<()> {
        match self.first_error() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

/// Run `f` over `items` with at most `limit` futures in flight
///
/// Scheduling stops as soon as `scope` reports a failure; futures already in
/// flight are driven to completion and their outputs returned in completion
/// order.
pub async fn for_each_bounded<I, F, Fut>(
    items: I,
    limit: usize,
    scope: &ErrorScope,
    mut f: F,
) -> Vec<Fut::Output>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Fut,
    Fut: Future,
{
    let limit = limit.max(1);
    let mut pending = items.into_iter();
    let mut in_flight = FuturesUnordered::new();
    let mut outputs = Vec::new();

    loop {
        while in_flight.len() < limit && !scope.has_failed() {
            match pending.next() {
                Some(item) => in_flight.push(f(item)),
                None => break,
            }
        }

        match in_flight.next().await {
            Some(output) => outputs.push(output),
            None => break,
        }
    }

    if scope.has_failed() {
        let skipped = pending.count();
        if skipped > 0 {
            tracing::debug!(skipped, "Stopped scheduling after failure");
        }
    }

    outputs
}
