//! Client-side data layer of the newsdesk publishing platform.
//!
//! List views share one contract, `{items, total, loading, error, refetch}`,
//! provided by [`query::ListQuery`]. Unfiltered lists are paginated by the
//! server; filtered or searched lists are fetched whole and filtered here
//! by [`filter::filter_and_paginate`]. When the API is unreachable, list
//! fetches are answered from a static snapshot ([`remote::SnapshotSource`]).

pub mod auth;
pub mod browse;
pub mod config;
pub mod console;
pub mod filter;
pub mod model;
pub mod query;
pub mod remote;
pub mod util;
