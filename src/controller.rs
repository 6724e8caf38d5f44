//! Catalog controller tying view state, the query cache and the API client together

use catalog_core::{CatalogPage, TagCount, VideoRecord};
use tracing::info;

use crate::api::CatalogClient;
use crate::cache::{Observation, QueryCache, QueryObserver};
use crate::view_state::{self, ViewState};

/// Everything a render needs for one frame
#[derive(Debug, Clone)]
pub struct CatalogView {
    pub state: ViewState,
    pub query: Observation<CatalogPage>,
    pub total_pages: u32,
    pub top_tags: Vec<TagCount>,
}

impl CatalogView {
    pub fn new(state: ViewState, query: Observation<CatalogPage>) -> Self {
        let page = query.data.as_deref();
        let total_pages = view_state::total_pages(page);
        let top_tags = view_state::top_tags(page);

        Self {
            state,
            query,
            total_pages,
            top_tags,
        }
    }

    /// Page currently displayed, possibly the previous filters' page while loading
    pub fn page(&self) -> Option<&CatalogPage> {
        self.query.data.as_deref()
    }
}

/// Owns the view state of one viewer and keeps its query in sync
pub struct CatalogController {
    state: ViewState,
    client: CatalogClient,
    observer: QueryObserver<CatalogPage>,
}

impl CatalogController {
    pub fn new(client: CatalogClient, cache: QueryCache<CatalogPage>, state: ViewState) -> Self {
        Self {
            state,
            client,
            observer: QueryObserver::new(cache),
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn set_search(&mut self, value: impl Into<String>) {
        self.state.set_search(value);
    }

    pub fn toggle_tag(&mut self, tag: &str) {
        self.state.toggle_tag(tag);
    }

    pub fn set_page(&mut self, page: u32) {
        self.state.set_page(page);
    }

    pub fn select_video(&mut self, video: VideoRecord) {
        self.state.select_video(video);
    }

    /// Open the detail overlay for a record on the displayed page
    pub fn select_video_by_id(&mut self, id: &str) -> bool {
        let found = self
            .observer
            .snapshot()
            .data
            .and_then(|page| page.find(id).cloned());

        match found {
            Some(video) => {
                self.state.select_video(video);
                true
            }
            None => false,
        }
    }

    pub fn close_detail(&mut self) {
        self.state.close_detail();
    }

    /// Request (or reuse) the page for the current filters and describe the result
    pub fn observe(&mut self) -> CatalogView {
        let filters = self.state.filters();
        let key = filters.query_key();
        let client = self.client.clone();

        let query = self
            .observer
            .observe(key, move || async move { client.fetch(&filters).await });

        CatalogView::new(self.state.clone(), query)
    }

    /// Like [`CatalogController::observe`], then wait for the request to settle
    pub async fn settle(&mut self) -> CatalogView {
        self.observe();
        let query = self.observer.settle().await;
        CatalogView::new(self.state.clone(), query)
    }

    /// Fetch the current filters again regardless of freshness
    pub fn refetch(&mut self) -> CatalogView {
        let filters = self.state.filters();
        if self.observer.current_key() != Some(&filters.query_key()) {
            // filters changed since the last observation, a plain request is enough
            return self.observe();
        }
        let client = self.client.clone();

        info!("🔄 Refetching page {} of the catalog", filters.page());
        let query = self
            .observer
            .refetch(move || async move { client.fetch(&filters).await });

        CatalogView::new(self.state.clone(), query)
    }

    /// Wait until the cache changes so the caller can re-render
    pub async fn changed(&mut self) -> bool {
        self.observer.changed().await
    }
}
