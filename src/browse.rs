//! View state of the public article grid.

use std::time::Duration;

use crate::filter::category_options;
use crate::model::{Article, QueryParams, ALL_CATEGORIES};
use crate::query::{ArticlesQuery, QueryResult, QueryStatus};
use crate::remote::{ArticleSource, CategorySource, RemoteClient};
use crate::util::Debouncer;

pub const DEFAULT_GRID_PAGE_SIZE: usize = 9;
pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

/// Article grid with a category selector and a debounced search box.
///
/// Changing the category, or the search text once it has settled, jumps
/// back to page 1. Raw keystrokes never reach the query directly.
pub struct ArticleBrowser {
    query: ArticlesQuery,
    categories: CategorySource,
    search: Debouncer<String>,
    category: String,
    page: usize,
    page_size: usize,
    category_options: Vec<String>,
}

impl ArticleBrowser {
    pub fn new(client: RemoteClient, page_size: usize, debounce: Duration) -> Self {
        Self {
            query: ArticlesQuery::new(ArticleSource::new(client.clone())),
            categories: CategorySource::new(client),
            search: Debouncer::new(String::new(), debounce),
            category: ALL_CATEGORIES.to_string(),
            page: 1,
            page_size: page_size.max(1),
            category_options: vec![ALL_CATEGORIES.to_string()],
        }
    }

    /// Load category options and the first page.
    pub async fn start(&mut self) {
        self.category_options = category_options(&self.categories).await;
        self.load();
    }

    /// Fetch the current view. No-op if it is already loaded or loading.
    pub fn load(&mut self) {
        self.apply();
    }

    pub fn params(&self) -> QueryParams {
        QueryParams::new(self.page, self.page_size)
            .with_category(self.category.clone())
            .with_search(self.search.stable().clone())
    }

    pub fn result(&self) -> &QueryResult<Article> {
        self.query.result()
    }

    pub fn category_options(&self) -> &[String] {
        &self.category_options
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    /// Search text currently applied to the grid.
    pub fn search(&self) -> &str {
        self.search.stable()
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn select_category(&mut self, category: impl Into<String>) {
        let category = category.into();
        if category == self.category {
            return;
        }
        self.category = category;
        self.page = 1;
        self.apply();
    }

    /// Record raw search input. Takes effect after the debounce delay.
    pub fn type_search(&mut self, raw: impl Into<String>) {
        self.search.push(raw.into());
    }

    /// Apply pending search input now instead of waiting out the delay.
    pub fn submit_search(&mut self) {
        if self.search.flush().is_some() {
            self.on_search_settled();
        }
    }

    /// Go to `page`, clamped to the known page range.
    ///
    /// While a fetch is in flight the page count is unknown, so only the
    /// lower bound applies; the upper bound is enforced once it lands.
    pub fn go_to_page(&mut self, page: usize) {
        let mut page = page.max(1);
        if let Some(last) = self.known_page_count() {
            page = page.min(last);
        }
        if page != self.page {
            self.page = page;
            self.apply();
        }
    }

    pub fn next_page(&mut self) {
        self.go_to_page(self.page.saturating_add(1));
    }

    pub fn prev_page(&mut self) {
        if self.page > 1 {
            self.go_to_page(self.page - 1);
        }
    }

    pub fn refetch(&mut self) {
        self.query.refetch();
    }

    /// Periodic driver: emit settled search input and apply finished fetches.
    /// Returns whether the visible result changed.
    pub fn tick(&mut self) -> bool {
        if self.search.poll().is_some() {
            self.on_search_settled();
        }
        let changed = self.query.poll();
        if changed {
            self.clamp_to_last_page();
        }
        changed
    }

    /// Wait out any pending search input, then the fetch it starts.
    pub async fn settle(&mut self) -> &QueryResult<Article> {
        if self.search.settle().await.is_some() {
            self.on_search_settled();
        }
        self.query.settle().await;
        if self.clamp_to_last_page() {
            self.query.settle().await;
        }
        self.query.result()
    }

    /// Page count of the latest successful fetch, if one is showing.
    fn known_page_count(&self) -> Option<usize> {
        let result = self.query.result();
        (result.status == QueryStatus::Success).then(|| result.total_pages())
    }

    /// Pull the page back into range after a fetch revealed fewer pages.
    fn clamp_to_last_page(&mut self) -> bool {
        match self.known_page_count() {
            Some(last) if self.page > last => {
                tracing::debug!(page = self.page, last, "Requested page past the end");
                self.page = last;
                self.apply();
                true
            }
            _ => false,
        }
    }

    fn on_search_settled(&mut self) {
        tracing::debug!(search = %self.search.stable(), "Search input settled");
        self.page = 1;
        self.apply();
    }

    fn apply(&mut self) {
        let params = self.params();
        self.query.set_params(params);
    }
}
