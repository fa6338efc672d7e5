use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::client::{Endpoint, FetchError, RemoteClient};
use crate::model::{Article, Category};
use crate::util::strip_control_chars;

/// Fields an editor submits for a new or updated article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleDraft {
    pub title: String,
    pub content: String,
    pub category_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl ArticleDraft {
    fn sanitized(&self) -> Result<Self, FetchError> {
        let title = strip_control_chars(&self.title).trim().to_owned();
        if title.is_empty() {
            return Err(FetchError::InvalidInput(
                "Article title cannot be empty".to_string(),
            ));
        }
        if self.category_id.trim().is_empty() {
            return Err(FetchError::InvalidInput(
                "Article must belong to a category".to_string(),
            ));
        }
        Ok(Self {
            title,
            content: self.content.clone(),
            category_id: self.category_id.trim().to_owned(),
            image_url: self
                .image_url
                .as_deref()
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .map(str::to_owned),
        })
    }
}

/// Fields submitted from the category modal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryDraft {
    pub name: String,
}

impl CategoryDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Strips control characters and surrounding whitespace; rejects blank names.
    fn sanitized(&self) -> Result<Self, FetchError> {
        let name = strip_control_chars(&self.name).trim().to_owned();
        if name.is_empty() {
            return Err(FetchError::InvalidInput(
                "Category name cannot be empty or whitespace-only".to_string(),
            ));
        }
        Ok(Self { name })
    }
}

/// Mutation endpoints answer with the item, sometimes wrapped in `data`.
#[derive(Deserialize)]
#[serde(untagged)]
enum ItemPayload<T> {
    Wrapped { data: T },
    Bare(T),
}

impl RemoteClient {
    // ========================================================================
    // Article Mutations
    // ========================================================================

    pub async fn create_article(&self, draft: &ArticleDraft) -> Result<Article, FetchError> {
        let draft = draft.sanitized()?;
        let url = self.url_for(&[Endpoint::ARTICLES.path])?;
        let article: Article = self.send_for_item(Method::POST, url, &draft).await?;
        tracing::info!(id = %article.id, title = %article.title, "Created article");
        Ok(article)
    }

    pub async fn update_article(
        &self,
        id: &str,
        draft: &ArticleDraft,
    ) -> Result<Article, FetchError> {
        let draft = draft.sanitized()?;
        let url = self.url_for(&[Endpoint::ARTICLES.path, id])?;
        let article = self
            .send_for_item(Method::PATCH, url, &draft)
            .await
            .map_err(|e| not_found(e, "article", id))?;
        tracing::info!(id = %id, "Updated article");
        Ok(article)
    }

    pub async fn delete_article(&self, id: &str) -> Result<(), FetchError> {
        let url = self.url_for(&[Endpoint::ARTICLES.path, id])?;
        self.send(Method::DELETE, url, None::<&()>)
            .await
            .map_err(|e| not_found(e, "article", id))?;
        tracing::info!(id = %id, "Deleted article");
        Ok(())
    }

    // ========================================================================
    // Category Mutations
    // ========================================================================

    pub async fn create_category(&self, draft: &CategoryDraft) -> Result<Category, FetchError> {
        let draft = draft.sanitized()?;
        let url = self.url_for(&[Endpoint::CATEGORIES.path])?;
        let category: Category = self.send_for_item(Method::POST, url, &draft).await?;
        tracing::info!(id = %category.id, name = %category.name, "Created category");
        Ok(category)
    }

    pub async fn update_category(
        &self,
        id: &str,
        draft: &CategoryDraft,
    ) -> Result<Category, FetchError> {
        let draft = draft.sanitized()?;
        let url = self.url_for(&[Endpoint::CATEGORIES.path, id])?;
        let category = self
            .send_for_item(Method::PUT, url, &draft)
            .await
            .map_err(|e| not_found(e, "category", id))?;
        tracing::info!(id = %id, name = %draft.name, "Updated category");
        Ok(category)
    }

    pub async fn delete_category(&self, id: &str) -> Result<(), FetchError> {
        let url = self.url_for(&[Endpoint::CATEGORIES.path, id])?;
        self.send(Method::DELETE, url, None::<&()>)
            .await
            .map_err(|e| not_found(e, "category", id))?;
        tracing::info!(id = %id, "Deleted category");
        Ok(())
    }

    async fn send_for_item<B, T>(&self, method: Method, url: url::Url, body: &B) -> Result<T, FetchError>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let origin = url.to_string();
        let bytes = self.send(method, url, Some(body)).await?;
        let payload: ItemPayload<T> =
            serde_json::from_slice(&bytes).map_err(|e| FetchError::parse(origin, e))?;
        Ok(match payload {
            ItemPayload::Wrapped { data } => data,
            ItemPayload::Bare(item) => item,
        })
    }
}

fn not_found(err: FetchError, resource: &'static str, id: &str) -> FetchError {
    match err {
        FetchError::HttpStatus(404) => FetchError::NotFound {
            resource,
            id: id.to_string(),
        },
        other => other,
    }
}
