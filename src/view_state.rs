//! User-editable view state and the values derived from it

use catalog_core::{top_tags as rank_tags, CatalogPage, FilterSet, TagCount, VideoRecord, DEFAULT_PAGE_SIZE};
use serde::{Deserialize, Serialize};

/// Number of tags shown in the tag cloud
pub const TOP_TAG_LIMIT: usize = 10;

/// Search text, tag selection, pagination and the record open in the detail overlay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewState {
    search: String,
    selected_tags: Vec<String>,
    page: u32,
    page_size: u32,
    active_video: Option<VideoRecord>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl ViewState {
    /// Fresh state on page 1 with nothing selected
    pub fn new(page_size: u32) -> Self {
        Self {
            search: String::new(),
            selected_tags: Vec::new(),
            page: 1,
            page_size: page_size.max(1),
            active_video: None,
        }
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    /// Selected tags in the order they were picked
    pub fn selected_tags(&self) -> &[String] {
        &self.selected_tags
    }

    pub fn is_selected(&self, tag: &str) -> bool {
        self.selected_tags.iter().any(|selected| selected == tag)
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Record shown in the detail overlay, if any
    pub fn active_video(&self) -> Option<&VideoRecord> {
        self.active_video.as_ref()
    }

    /// Replace the search text and go back to page 1
    pub fn set_search(&mut self, value: impl Into<String>) {
        self.search = value.into();
        self.page = 1;
    }

    /// Deselect `tag` if selected, otherwise append it; go back to page 1
    pub fn toggle_tag(&mut self, tag: &str) {
        if self.is_selected(tag) {
            self.selected_tags.retain(|selected| selected != tag);
        } else {
            self.selected_tags.push(tag.to_string());
        }
        self.page = 1;
    }

    /// Jump to page `page`. Bounds are the pager's job, nothing is clamped here.
    pub fn set_page(&mut self, page: u32) {
        self.page = page;
    }

    pub fn select_video(&mut self, video: VideoRecord) {
        self.active_video = Some(video);
    }

    pub fn close_detail(&mut self) {
        self.active_video = None;
    }

    /// Filter set describing the request for this state
    pub fn filters(&self) -> FilterSet {
        FilterSet::builder()
            .search(self.search.clone())
            .tags(self.selected_tags.iter().cloned())
            .page(self.page)
            .page_size(self.page_size)
            .build()
    }
}

/// `max(1, ceil(total / pageSize))` of the latest page, 1 before anything loaded
pub fn total_pages(page: Option<&CatalogPage>) -> u32 {
    page.map_or(1, CatalogPage::total_pages)
}

/// Up to [`TOP_TAG_LIMIT`] most frequent tags of the latest page, highest first
pub fn top_tags(page: Option<&CatalogPage>) -> Vec<TagCount> {
    page.map(|page| rank_tags(&page.tag_counts, TOP_TAG_LIMIT))
        .unwrap_or_default()
}
