//! List queries: the uniform `{items, total, loading, error, refetch}`
//! contract shared by every list view.
//!
//! A query decides per parameter set whether the server paginates
//! ([`FilterMode::Remote`](crate::model::FilterMode)) or whether the full
//! collection is fetched and filtered locally
//! ([`FilterMode::Local`](crate::model::FilterMode)), and guarantees that a
//! stale response never overwrites a newer one.

mod list;
mod state;

pub use list::{resolve, ListQuery};
pub use state::{Completion, QueryResult, QueryStatus};

use crate::remote::{ArticleSource, CategorySource};

/// Query over `/articles`.
pub type ArticlesQuery = ListQuery<ArticleSource>;

/// Query over `/categories`. Category queries carry no category filter;
/// search matches category names.
pub type CategoriesQuery = ListQuery<CategorySource>;
