//! Canonical cache keys for catalog requests

use crate::FilterSet;
use std::fmt;

/// Canonical identity of a catalog request.
///
/// Built from every field of a [`FilterSet`] in a fixed order. Tags are
/// sorted and deduplicated, and free text is percent-encoded so that `,`,
/// `&` or `=` inside a value can never be confused with a separator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(String);

impl QueryKey {
    /// Scope prefix shared by all catalog keys
    pub const SCOPE: &'static str = "videos";

    /// Derive the key for a filter set
    pub fn from_filters(filters: &FilterSet) -> Self {
        let mut tags: Vec<&str> = filters.tags().iter().map(String::as_str).collect();
        tags.sort_unstable();
        tags.dedup();

        let tags = tags
            .into_iter()
            .map(|tag| urlencoding::encode(tag).into_owned())
            .collect::<Vec<_>>()
            .join(",");

        Self(format!(
            "{}?search={}&tags={}&page={}&pageSize={}",
            Self::SCOPE,
            urlencoding::encode(filters.search()),
            tags,
            filters.page(),
            filters.page_size()
        ))
    }

    /// The canonical key string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short digest of the key for log lines
    pub fn fingerprint(&self) -> String {
        let digest = md5::compute(self.0.as_bytes());
        format!("{:x}", digest)[..8].to_string()
    }
}

impl From<&FilterSet> for QueryKey {
    fn from(filters: &FilterSet) -> Self {
        Self::from_filters(filters)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
