//! JSON shapes of the list endpoints and snapshot files.
//!
//! The two list endpoints disagree on naming: articles answer
//! `{data, total, page, limit}`, categories answer
//! `{data, totalData, currentPage, totalPages}`. Both are normalized into
//! [`CollectionPage`].

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::model::{Article, Category, CollectionPage};

/// A list endpoint response that can be turned into items or a page.
pub(crate) trait PagePayload: DeserializeOwned {
    type Item: DeserializeOwned;

    fn into_items(self) -> Vec<Self::Item>;

    /// Normalize into a page. `page` and `limit` are the requested values,
    /// used where the server leaves them out.
    fn into_page(self, page: usize, limit: usize) -> CollectionPage<Self::Item>;
}

#[derive(Debug, Deserialize)]
pub(crate) struct ArticlesPayload {
    pub data: Vec<Article>,
    #[serde(default)]
    pub total: Option<usize>,
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl PagePayload for ArticlesPayload {
    type Item = Article;

    fn into_items(self) -> Vec<Article> {
        self.data
    }

    fn into_page(self, page: usize, limit: usize) -> CollectionPage<Article> {
        let total = self.total.unwrap_or(self.data.len());
        CollectionPage {
            total,
            page: self.page.unwrap_or(page),
            limit: self.limit.unwrap_or(limit),
            items: self.data,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CategoriesPayload {
    pub data: Vec<Category>,
    #[serde(default)]
    pub total_data: Option<usize>,
    #[serde(default)]
    pub current_page: Option<usize>,
}

impl PagePayload for CategoriesPayload {
    type Item = Category;

    fn into_items(self) -> Vec<Category> {
        self.data
    }

    fn into_page(self, page: usize, limit: usize) -> CollectionPage<Category> {
        let total = self.total_data.unwrap_or(self.data.len());
        CollectionPage {
            total,
            page: self.current_page.unwrap_or(page),
            limit,
            items: self.data,
        }
    }
}

/// Snapshot files hold either a bare array or the live `{data: [...]}` body.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum SnapshotPayload<T> {
    Bare(Vec<T>),
    Wrapped { data: Vec<T> },
}

impl<T> SnapshotPayload<T> {
    pub fn into_items(self) -> Vec<T> {
        match self {
            SnapshotPayload::Bare(items) | SnapshotPayload::Wrapped { data: items } => items,
        }
    }
}
