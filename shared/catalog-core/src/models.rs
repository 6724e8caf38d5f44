//! Catalog page and video record models

use crate::tags::{count_tags, sorted_tags};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single short video in the catalog
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRecord {
    /// Unique record identifier
    pub id: String,

    /// AI-generated summary of the video
    #[serde(default)]
    pub summary: String,

    /// Tags attached to the video
    #[serde(default)]
    pub tags: Vec<String>,

    /// Playable (signed) media URL, empty when unavailable
    #[serde(rename = "signedUrl", default)]
    pub media_url: String,

    /// Publish timestamp as sent by the backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,

    /// Full transcript (if available)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,

    /// Storage URI of the video, used as the poster image
    #[serde(rename = "videoUri", default, skip_serializing_if = "Option::is_none")]
    pub poster_uri: Option<String>,
}

impl VideoRecord {
    /// Parse `created_at` into a UTC timestamp.
    ///
    /// Accepts RFC 3339 as well as zone-less date-times and plain dates,
    /// which are taken as UTC.
    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.created_at.as_deref()?.trim();

        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.with_timezone(&Utc));
        }

        for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
                return Some(naive.and_utc());
            }
        }

        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    }
}

/// `/api/videos` response body exactly as the backend sends it.
///
/// `availableTags` and `tagCounts` are optional on the wire; converting into
/// a [`CatalogPage`] fills them in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCatalogPage {
    pub items: Vec<VideoRecord>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_counts: Option<BTreeMap<String, u64>>,
}

/// One page of catalog results with complete tag statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogPage {
    /// Records on this page, in backend order
    pub items: Vec<VideoRecord>,

    /// Number of records matching the filters across all pages
    pub total: u64,

    /// Page number the backend answered with
    pub page: u32,

    /// Page size the backend answered with
    pub page_size: u32,

    /// Sorted, deduplicated tags the user can filter by
    pub available_tags: Vec<String>,

    /// Occurrences per tag
    pub tag_counts: BTreeMap<String, u64>,
}

impl CatalogPage {
    /// Number of pages for `total` records, never less than 1
    pub fn total_pages(&self) -> u32 {
        if self.page_size == 0 {
            return 1;
        }
        let pages = self.total.div_ceil(u64::from(self.page_size));
        u32::try_from(pages).unwrap_or(u32::MAX).max(1)
    }

    /// Look up a record on this page by id
    pub fn find(&self, id: &str) -> Option<&VideoRecord> {
        self.items.iter().find(|item| item.id == id)
    }
}

impl From<RawCatalogPage> for CatalogPage {
    fn from(raw: RawCatalogPage) -> Self {
        let tag_counts = raw
            .tag_counts
            .unwrap_or_else(|| count_tags(&raw.items));

        let available_tags = match raw.available_tags {
            Some(tags) => sorted_tags(tags),
            None => tag_counts.keys().cloned().collect(),
        };

        Self {
            items: raw.items,
            total: raw.total,
            page: raw.page,
            page_size: raw.page_size,
            available_tags,
            tag_counts,
        }
    }
}
