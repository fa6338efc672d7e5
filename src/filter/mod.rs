//! Client-side filtering over full collections.
//!
//! - [`engine`] - category/search filter plus pagination ([`filter_and_paginate`])
//! - [`names`] - distinct, sorted category names for filter selectors
//!
//! Filtering is pure: the same inputs always produce the same page.

mod engine;
mod names;

pub use engine::{filter_and_paginate, Filterable};
pub use names::{category_options, unique_category_names};
