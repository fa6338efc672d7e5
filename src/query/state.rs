use std::sync::Arc;

use crate::model::{CollectionPage, QueryParams};
use crate::remote::FetchError;

/// Lifecycle of a list query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// No parameters set yet.
    Idle,
    /// A fetch cycle is in flight.
    Loading,
    /// The latest cycle produced a page.
    Success,
    /// The latest cycle failed; see [`QueryResult::error`].
    Failed,
}

/// What a view renders from a list query.
///
/// Items stay from the last successful cycle while a new one is loading,
/// so a view does not flash empty between pages. `items` is shared, making
/// the whole result cheap to clone.
#[derive(Debug)]
pub struct QueryResult<T> {
    pub items: Arc<Vec<T>>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub status: QueryStatus,
    pub error: Option<Arc<FetchError>>,
}

// Manual impl: derive would require `T: Clone`.
impl<T> Clone for QueryResult<T> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
            total: self.total,
            page: self.page,
            limit: self.limit,
            status: self.status,
            error: self.error.clone(),
        }
    }
}

impl<T> Default for QueryResult<T> {
    fn default() -> Self {
        Self {
            items: Arc::new(Vec::new()),
            total: 0,
            page: 1,
            limit: 1,
            status: QueryStatus::Idle,
            error: None,
        }
    }
}

impl<T> QueryResult<T> {
    pub fn loading(&self) -> bool {
        self.status == QueryStatus::Loading
    }

    /// Pages needed for `total` at the current limit, never less than one.
    pub fn total_pages(&self) -> usize {
        self.total.div_ceil(self.limit.max(1)).max(1)
    }

    pub(crate) fn begin(&mut self, params: &QueryParams) {
        self.status = QueryStatus::Loading;
        self.error = None;
        self.page = params.page;
        self.limit = params.limit;
    }

    /// Publish a finished page. Page number and limit come from the
    /// requested `params`; only items and `total` are taken from the answer.
    pub(crate) fn succeed(&mut self, params: &QueryParams, page: CollectionPage<T>) {
        self.items = Arc::new(page.items);
        self.total = page.total;
        self.page = params.page;
        self.limit = params.limit;
        self.status = QueryStatus::Success;
        self.error = None;
    }

    pub(crate) fn fail(&mut self, error: FetchError) {
        self.status = QueryStatus::Failed;
        self.error = Some(Arc::new(error));
    }
}

/// Result of one fetch cycle, tagged with the generation that started it.
#[derive(Debug)]
pub struct Completion<T> {
    pub generation: u64,
    pub params: QueryParams,
    pub result: Result<CollectionPage<T>, FetchError>,
}
