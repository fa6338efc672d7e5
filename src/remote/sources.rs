use super::client::{Endpoint, FetchError, Fetched, RemoteClient};
use super::wire::{ArticlesPayload, CategoriesPayload};
use super::ListSource;
use crate::model::{Article, Category};

/// `/articles`, with `articles.json` as snapshot.
#[derive(Debug, Clone)]
pub struct ArticleSource {
    client: RemoteClient,
}

impl ArticleSource {
    pub fn new(client: RemoteClient) -> Self {
        Self { client }
    }
}

impl ListSource for ArticleSource {
    type Item = Article;

    fn name(&self) -> &'static str {
        Endpoint::ARTICLES.path
    }

    async fn fetch_collection(&self) -> Result<Vec<Article>, FetchError> {
        self.client
            .collection::<ArticlesPayload>(Endpoint::ARTICLES)
            .await
    }

    async fn fetch_page(&self, page: usize, limit: usize) -> Result<Fetched<Article>, FetchError> {
        self.client
            .page::<ArticlesPayload>(Endpoint::ARTICLES, page, limit)
            .await
    }
}

/// `/categories`, with `categories.json` as snapshot.
#[derive(Debug, Clone)]
pub struct CategorySource {
    client: RemoteClient,
}

impl CategorySource {
    pub fn new(client: RemoteClient) -> Self {
        Self { client }
    }
}

impl ListSource for CategorySource {
    type Item = Category;

    fn name(&self) -> &'static str {
        Endpoint::CATEGORIES.path
    }

    async fn fetch_collection(&self) -> Result<Vec<Category>, FetchError> {
        self.client
            .collection::<CategoriesPayload>(Endpoint::CATEGORIES)
            .await
    }

    async fn fetch_page(&self, page: usize, limit: usize) -> Result<Fetched<Category>, FetchError> {
        self.client
            .page::<CategoriesPayload>(Endpoint::CATEGORIES, page, limit)
            .await
    }
}
