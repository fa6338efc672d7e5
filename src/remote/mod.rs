//! Remote access to the publishing API.
//!
//! - [`client`] - HTTP plumbing, snapshot fallback, single-article fetch
//! - [`snapshot`] - location and loading of the static snapshot collections
//! - [`sources`] - per-resource [`ListSource`] implementations used by queries
//! - [`mutations`] - create/update/delete helpers for the admin console
//! - [`wire`] - JSON shapes of the list endpoints
//!
//! List fetches try the live endpoint first. Any failure there (transport,
//! non-2xx, malformed body) is logged and answered from the snapshot
//! resource instead; a snapshot failure is returned to the caller unchanged.

mod client;
mod mutations;
mod snapshot;
mod sources;
mod wire;

use std::future::Future;

use crate::filter::Filterable;

pub use client::{FetchError, Fetched, RemoteClient};
pub use mutations::{ArticleDraft, CategoryDraft};
pub use snapshot::SnapshotSource;
pub use sources::{ArticleSource, CategorySource};

/// A list resource that can be fetched whole or by page.
///
/// Implemented by [`ArticleSource`] and [`CategorySource`]; tests substitute
/// in-memory sources.
pub trait ListSource: Clone + Send + Sync + 'static {
    type Item: Filterable + Clone + Send + Sync + 'static;

    /// Resource name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Every item in the collection, in server order.
    fn fetch_collection(
        &self,
    ) -> impl Future<Output = Result<Vec<Self::Item>, FetchError>> + Send;

    /// One server page, or the whole snapshot if the live call failed.
    fn fetch_page(
        &self,
        page: usize,
        limit: usize,
    ) -> impl Future<Output = Result<Fetched<Self::Item>, FetchError>> + Send;
}
