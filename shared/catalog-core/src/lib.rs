//! Catalog Core - Shared data structures for the video catalog viewer
//!
//! Everything in here is pure: filter sets, the query keys derived from them,
//! the catalog page model and the tag statistics computed over it.

pub mod filters;
pub mod models;
pub mod query_key;
pub mod tags;

pub use filters::{FilterSet, FilterSetBuilder, DEFAULT_PAGE, DEFAULT_PAGE_SIZE};
pub use models::{CatalogPage, RawCatalogPage, VideoRecord};
pub use query_key::QueryKey;
pub use tags::{count_tags, sorted_tags, top_tags, TagCount};
