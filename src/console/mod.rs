//! Admin console state: the signed-in session, the modal slot, and the
//! article and category list queries the console edits.
//!
//! Every successful mutation refetches the list it affects, so the visible
//! page never shows a row that was just deleted or misses one just created.

mod modal;

pub use modal::{DeleteKind, Modal};

use thiserror::Error;

use crate::auth::{admin_access, Access, Session};
use crate::model::{Article, Category};
use crate::query::{ArticlesQuery, CategoriesQuery};
use crate::remote::{
    ArticleDraft, ArticleSource, CategoryDraft, CategorySource, FetchError, RemoteClient,
};

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("Admin access required ({0:?})")]
    Denied(Access),
    #[error("No modal is open")]
    NoModal,
    #[error("A name is required")]
    MissingInput,
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Which list a modal submission changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submitted {
    CategoryCreated(Category),
    CategoryUpdated(Category),
    Deleted { kind: DeleteKind, id: String },
}

pub struct ConsoleState {
    client: RemoteClient,
    session: Option<Session>,
    modal: Option<Modal>,
    pub articles: ArticlesQuery,
    pub categories: CategoriesQuery,
}

impl ConsoleState {
    /// List reads go through `client` unauthenticated; mutations use the
    /// session token.
    pub fn new(client: RemoteClient) -> Self {
        Self {
            articles: ArticlesQuery::new(ArticleSource::new(client.clone())),
            categories: CategoriesQuery::new(CategorySource::new(client.clone())),
            client,
            session: None,
            modal: None,
        }
    }

    // ========================================================================
    // Session
    // ========================================================================

    pub fn sign_in(&mut self, session: Session) {
        tracing::debug!(user = %session.user.username, "Console session started");
        self.session = Some(session);
    }

    /// Drop the session and any open modal.
    pub fn sign_out(&mut self) {
        if let Some(session) = self.session.take() {
            tracing::info!(user = %session.user.username, "Signed out");
        }
        self.modal = None;
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn access(&self) -> Access {
        admin_access(self.session.as_ref().map(|s| &s.user))
    }

    fn admin_client(&self) -> Result<RemoteClient, ConsoleError> {
        match (self.access(), &self.session) {
            (Access::Granted, Some(session)) => {
                Ok(self.client.with_token(session.token().clone()))
            }
            (access, _) => Err(ConsoleError::Denied(access)),
        }
    }

    // ========================================================================
    // Modal Slot
    // ========================================================================

    /// Show `modal`, replacing whatever was open.
    pub fn open_modal(&mut self, modal: Modal) {
        self.modal = Some(modal);
    }

    pub fn close_modal(&mut self) {
        self.modal = None;
    }

    pub fn modal(&self) -> Option<&Modal> {
        self.modal.as_ref()
    }

    /// Carry out the open modal's action.
    ///
    /// On success the modal closes and the affected list is refetched. On
    /// failure the modal stays open so the user can retry or cancel.
    pub async fn submit_modal(&mut self, input: Option<&str>) -> Result<Submitted, ConsoleError> {
        let modal = self.modal.clone().ok_or(ConsoleError::NoModal)?;
        let client = self.admin_client()?;

        let name = || {
            input
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .ok_or(ConsoleError::MissingInput)
        };

        let outcome = match &modal {
            Modal::CreateCategory => {
                let category = client.create_category(&CategoryDraft::new(name()?)).await?;
                self.categories.refetch();
                Submitted::CategoryCreated(category)
            }
            Modal::EditCategory { id, .. } => {
                let category = client
                    .update_category(id, &CategoryDraft::new(name()?))
                    .await?;
                self.categories.refetch();
                // Articles embed their category's name
                self.articles.refetch();
                Submitted::CategoryUpdated(category)
            }
            Modal::Delete { kind, id, .. } => {
                match kind {
                    DeleteKind::Article => {
                        client.delete_article(id).await?;
                        self.articles.refetch();
                    }
                    DeleteKind::Category => {
                        client.delete_category(id).await?;
                        self.categories.refetch();
                    }
                }
                Submitted::Deleted {
                    kind: *kind,
                    id: id.clone(),
                }
            }
        };

        self.modal = None;
        Ok(outcome)
    }

    // ========================================================================
    // Article Editor
    // ========================================================================

    pub async fn create_article(&mut self, draft: &ArticleDraft) -> Result<Article, ConsoleError> {
        let article = self.admin_client()?.create_article(draft).await?;
        self.articles.refetch();
        Ok(article)
    }

    pub async fn update_article(
        &mut self,
        id: &str,
        draft: &ArticleDraft,
    ) -> Result<Article, ConsoleError> {
        let article = self.admin_client()?.update_article(id, draft).await?;
        self.articles.refetch();
        Ok(article)
    }

    /// Fetch one article for the edit form.
    pub async fn load_article(&self, id: &str) -> Result<Article, ConsoleError> {
        Ok(self.client.fetch_article(id).await?)
    }
}
