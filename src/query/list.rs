use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::state::{Completion, QueryResult, QueryStatus};
use crate::filter::filter_and_paginate;
use crate::model::{CollectionPage, FilterMode, QueryParams};
use crate::remote::{FetchError, Fetched, ListSource};

/// Completions buffered between the fetch tasks and the query owner.
const COMPLETION_BUFFER: usize = 16;

/// Answer `params` from `source` once, choosing Remote or Local mode.
///
/// - Local: fetch the whole collection and filter/paginate it here.
/// - Remote: fetch one server page and trust its `total`. If the server was
///   unreachable and the snapshot answered instead, the snapshot is
///   filtered/paginated here as in Local mode.
pub async fn resolve<S: ListSource>(
    source: &S,
    params: &QueryParams,
) -> Result<CollectionPage<S::Item>, FetchError> {
    match params.mode() {
        FilterMode::Local => {
            let all = source.fetch_collection().await?;
            Ok(filter_and_paginate(&all, params))
        }
        FilterMode::Remote => match source.fetch_page(params.page, params.limit).await? {
            Fetched::Page(mut page) => {
                if page.items.len() > params.limit {
                    tracing::debug!(
                        resource = source.name(),
                        received = page.items.len(),
                        limit = params.limit,
                        "Server returned more items than requested, truncating"
                    );
                    page.items.truncate(params.limit);
                }
                Ok(page)
            }
            Fetched::Snapshot(all) => Ok(filter_and_paginate(&all, params)),
        },
    }
}

/// Stateful list query owned by one view.
///
/// Each parameter change or [`refetch`](ListQuery::refetch) starts a fetch
/// cycle on a spawned task and bumps the generation counter. Completions
/// come back over a channel and are applied by [`poll`](ListQuery::poll) or
/// [`settle`](ListQuery::settle); any completion whose generation is no
/// longer current is dropped, so the latest parameters always win even when
/// responses arrive out of order.
///
/// Must be used inside a tokio runtime.
pub struct ListQuery<S: ListSource> {
    source: S,
    params: Option<QueryParams>,
    generation: u64,
    result: QueryResult<S::Item>,
    in_flight: Option<JoinHandle<()>>,
    tx: mpsc::Sender<Completion<S::Item>>,
    rx: mpsc::Receiver<Completion<S::Item>>,
}

impl<S: ListSource> ListQuery<S> {
    pub fn new(source: S) -> Self {
        let (tx, rx) = mpsc::channel(COMPLETION_BUFFER);
        Self {
            source,
            params: None,
            generation: 0,
            result: QueryResult::default(),
            in_flight: None,
            tx,
            rx,
        }
    }

    pub fn result(&self) -> &QueryResult<S::Item> {
        &self.result
    }

    pub fn params(&self) -> Option<&QueryParams> {
        self.params.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Apply new parameters. Starts a cycle only if they differ from the
    /// current ones; returns whether a cycle was started.
    pub fn set_params(&mut self, params: QueryParams) -> bool {
        if self.params.as_ref() == Some(&params) {
            return false;
        }
        self.params = Some(params);
        self.start_cycle();
        true
    }

    /// Re-run the current parameters, e.g. after a create/update/delete.
    ///
    /// Does nothing while the query is idle.
    pub fn refetch(&mut self) {
        if self.params.is_some() {
            self.start_cycle();
        }
    }

    fn start_cycle(&mut self) {
        let Some(params) = self.params.clone() else {
            return;
        };

        // Best effort: the generation check below is what guarantees ordering.
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }

        self.generation = self.generation.wrapping_add(1);
        let generation = self.generation;
        self.result.begin(&params);

        tracing::debug!(
            resource = self.source.name(),
            generation,
            page = params.page,
            limit = params.limit,
            mode = ?params.mode(),
            "Starting fetch cycle"
        );

        let source = self.source.clone();
        let tx = self.tx.clone();
        self.in_flight = Some(tokio::spawn(async move {
            let result = match AssertUnwindSafe(resolve(&source, &params))
                .catch_unwind()
                .await
            {
                Ok(result) => result,
                Err(panic) => {
                    let message = panic
                        .downcast_ref::<&'static str>()
                        .map(|s| s.to_string())
                        .or_else(|| panic.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "unknown panic".to_string());
                    tracing::error!(resource = source.name(), generation, error = %message, "Fetch task panicked");
                    Err(FetchError::TaskPanicked(message))
                }
            };

            let completion = Completion {
                generation,
                params,
                result,
            };
            if let Err(e) = tx.send(completion).await {
                tracing::debug!(error = %e, "Query dropped before fetch completed");
            }
        }));
    }

    /// Apply a completion. Returns `false` if it was stale and ignored.
    pub fn apply(&mut self, completion: Completion<S::Item>) -> bool {
        if completion.generation != self.generation {
            tracing::debug!(
                resource = self.source.name(),
                expected = self.generation,
                got = completion.generation,
                "Ignoring stale fetch result (generation mismatch)"
            );
            return false;
        }

        self.in_flight = None;
        match completion.result {
            Ok(page) => {
                tracing::debug!(
                    resource = self.source.name(),
                    generation = completion.generation,
                    items = page.items.len(),
                    total = page.total,
                    "Fetch cycle completed"
                );
                self.result.succeed(&completion.params, page);
            }
            Err(e) => {
                tracing::warn!(
                    resource = self.source.name(),
                    generation = completion.generation,
                    page = completion.params.page,
                    error = %e,
                    "Fetch cycle failed"
                );
                self.result.fail(e);
            }
        }
        true
    }

    /// Apply every completion already received, without waiting.
    /// Returns whether the visible result changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        while let Ok(completion) = self.rx.try_recv() {
            changed |= self.apply(completion);
        }
        changed
    }

    /// Wait until the current cycle has completed and return the result.
    ///
    /// Returns immediately when nothing is loading.
    pub async fn settle(&mut self) -> &QueryResult<S::Item> {
        while self.result.status == QueryStatus::Loading {
            // The query holds a sender, so the channel never closes here.
            let Some(completion) = self.rx.recv().await else {
                break;
            };
            self.apply(completion);
        }
        &self.result
    }
}

impl<S: ListSource> Drop for ListQuery<S> {
    fn drop(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
    }
}
