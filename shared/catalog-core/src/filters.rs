//! Filter sets describing a single catalog request

use crate::QueryKey;
use serde::{Deserialize, Serialize};

/// Page requested when none is given
pub const DEFAULT_PAGE: u32 = 1;

/// Page size requested when none is given
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// The user-controlled inputs of one catalog request.
///
/// A `FilterSet` is immutable; every change to search text, tag selection or
/// pagination produces a new one. Tags keep the order they were selected in
/// because that is the order they are sent in, but two filter sets that only
/// differ in tag order describe the same request and share a [`QueryKey`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSet {
    search: String,
    tags: Vec<String>,
    page: u32,
    page_size: u32,
}

impl FilterSet {
    /// Start building a filter set; unset fields take their defaults
    pub fn builder() -> FilterSetBuilder {
        FilterSetBuilder::default()
    }

    /// Free-text search, empty when not searching
    pub fn search(&self) -> &str {
        &self.search
    }

    /// Selected tags in selection order, without duplicates
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Requested page, always at least 1
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Requested page size, always greater than 0
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Canonical cache identity of this request
    pub fn query_key(&self) -> QueryKey {
        QueryKey::from_filters(self)
    }

    /// Query parameters sent to `/api/videos`.
    ///
    /// `search` and `tags` are left out when empty, `page` and `pageSize`
    /// are always present.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(4);

        if !self.search.is_empty() {
            pairs.push(("search", self.search.clone()));
        }

        if !self.tags.is_empty() {
            pairs.push(("tags", self.tags.join(",")));
        }

        pairs.push(("page", self.page.to_string()));
        pairs.push(("pageSize", self.page_size.to_string()));
        pairs
    }
}

impl Default for FilterSet {
    fn default() -> Self {
        FilterSetBuilder::default().build()
    }
}

/// Builder for [`FilterSet`]
#[derive(Debug, Clone, Default)]
pub struct FilterSetBuilder {
    search: Option<String>,
    tags: Vec<String>,
    page: Option<u32>,
    page_size: Option<u32>,
}

impl FilterSetBuilder {
    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Finish the filter set.
    ///
    /// Page 0 is raised to 1 and a page size of 0 falls back to
    /// [`DEFAULT_PAGE_SIZE`]; repeated tags are kept once, at their first
    /// position.
    pub fn build(self) -> FilterSet {
        let mut tags: Vec<String> = Vec::with_capacity(self.tags.len());
        for tag in self.tags {
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }

        FilterSet {
            search: self.search.unwrap_or_default(),
            tags,
            page: self.page.unwrap_or(DEFAULT_PAGE).max(1),
            page_size: match self.page_size {
                Some(0) | None => DEFAULT_PAGE_SIZE,
                Some(size) => size,
            },
        }
    }
}
