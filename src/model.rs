use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Sentinel category value meaning "no category filter".
pub const ALL_CATEGORIES: &str = "all";

// ============================================================================
// Entities
// ============================================================================

/// Author role as reported by the auth endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    User,
    Admin,
}

/// Authoring user embedded in articles and returned by `/auth/profile`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    pub username: String,
    pub role: Role,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Published article.
///
/// `category` and `user` are embedded by the list endpoints. Snapshot files
/// written by older exports may omit them, so both are optional here; an
/// article without a category never matches a category filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub category_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

impl Article {
    pub fn category_name(&self) -> Option<&str> {
        self.category.as_ref().map(|c| c.name.as_str())
    }
}

/// Accept both `"42"` and `42` for identifiers. The live API uses strings,
/// hand-written snapshot files frequently use numbers.
fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}

// ============================================================================
// Pages and Queries
// ============================================================================

/// One page of a collection.
///
/// `total` counts every item matching the filter that produced the page,
/// not just the items on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionPage<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
}

impl<T> CollectionPage<T> {
    pub fn empty(page: usize, limit: usize) -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page,
            limit,
        }
    }

    /// Number of pages needed to show `total` items, never less than one.
    pub fn total_pages(&self) -> usize {
        if self.limit == 0 {
            return 1;
        }
        self.total.div_ceil(self.limit).max(1)
    }
}

/// How a list query is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    /// Server paginates; its `total` is trusted.
    Remote,
    /// Full collection is fetched and filtered/paginated locally.
    Local,
}

/// Parameters a view hands to a list query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParams {
    pub page: usize,
    pub limit: usize,
    pub category: String,
    pub search: String,
}

impl Default for QueryParams {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            category: ALL_CATEGORIES.to_string(),
            search: String::new(),
        }
    }
}

impl QueryParams {
    pub fn new(page: usize, limit: usize) -> Self {
        Self {
            page: page.max(1),
            limit: limit.max(1),
            ..Self::default()
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn with_page(mut self, page: usize) -> Self {
        self.page = page.max(1);
        self
    }

    /// Category filter in effect, or `None` for `""` / `"all"`.
    ///
    /// Only the exact sentinel disables the filter; `"All"` is an ordinary
    /// category name.
    pub fn category_filter(&self) -> Option<&str> {
        let category = self.category.as_str();
        if category.is_empty() || category == ALL_CATEGORIES {
            None
        } else {
            Some(category)
        }
    }

    /// Trimmed search text, or `None` when blank.
    pub fn search_filter(&self) -> Option<&str> {
        let search = self.search.trim();
        (!search.is_empty()).then_some(search)
    }

    pub fn mode(&self) -> FilterMode {
        if self.category_filter().is_none() && self.search_filter().is_none() {
            FilterMode::Remote
        } else {
            FilterMode::Local
        }
    }
}
