use std::collections::BTreeSet;

use crate::model::{Category, ALL_CATEGORIES};
use crate::remote::ListSource;

/// Distinct category names, sorted, with `"all"` first.
///
/// Names are compared exactly (case-sensitive), so `"Tech"` and `"tech"`
/// are both kept.
pub fn unique_category_names(categories: &[Category]) -> Vec<String> {
    let distinct: BTreeSet<&str> = categories.iter().map(|c| c.name.as_str()).collect();

    let mut names = Vec::with_capacity(distinct.len() + 1);
    names.push(ALL_CATEGORIES.to_string());
    names.extend(distinct.into_iter().map(str::to_string));
    names
}

/// Options for a category selector, fetched from `source`.
///
/// Never fails: any fetch error is logged and the selector degrades to
/// `["all"]`. Unlike list queries, a broken category endpoint must not
/// block browsing.
pub async fn category_options<S>(source: &S) -> Vec<String>
where
    S: ListSource<Item = Category>,
{
    match source.fetch_collection().await {
        Ok(categories) => {
            let names = unique_category_names(&categories);
            tracing::debug!(count = names.len() - 1, "Loaded category options");
            names
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load categories, showing only \"all\"");
            vec![ALL_CATEGORIES.to_string()]
        }
    }
}
