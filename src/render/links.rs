//! Viewer URLs for every user action
//!
//! The server-rendered viewer has no client script: each interaction is a
//! link (or a GET form) whose query string encodes the next [`ViewState`].

use url::form_urlencoded;

use crate::view_state::ViewState;

/// Builds hrefs relative to the viewer root for a given state
#[derive(Debug, Clone)]
pub struct ViewerLinks<'a> {
    state: &'a ViewState,
}

impl<'a> ViewerLinks<'a> {
    pub fn new(state: &'a ViewState) -> Self {
        Self { state }
    }

    /// Link for the same filters on `page`
    pub fn page(&self, page: u32) -> String {
        let mut next = self.state.clone();
        next.set_page(page);
        href(&next)
    }

    /// Link that toggles `tag`, back on page 1
    pub fn toggle_tag(&self, tag: &str) -> String {
        let mut next = self.state.clone();
        next.toggle_tag(tag);
        href(&next)
    }

    /// Link opening the detail overlay for `video_id`
    pub fn open_video(&self, video_id: &str) -> String {
        let mut pairs = query_pairs(self.state);
        pairs.push(("video", video_id.to_string()));
        encode(&pairs)
    }

    /// Link for the current state without the detail overlay
    pub fn close_detail(&self) -> String {
        href(self.state)
    }

    /// Selected tags as the comma list carried by the search form
    pub fn tags_value(&self) -> String {
        self.state.selected_tags().join(",")
    }
}

fn href(state: &ViewState) -> String {
    encode(&query_pairs(state))
}

fn query_pairs(state: &ViewState) -> Vec<(&'static str, String)> {
    let mut pairs = Vec::new();
    if !state.search().is_empty() {
        pairs.push(("search", state.search().to_string()));
    }
    if !state.selected_tags().is_empty() {
        pairs.push(("tags", state.selected_tags().join(",")));
    }
    if state.page() != 1 {
        pairs.push(("page", state.page().to_string()));
    }
    pairs
}

fn encode(pairs: &[(&'static str, String)]) -> String {
    if pairs.is_empty() {
        return "/".to_string();
    }

    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs.iter().map(|(k, v)| (*k, v.as_str())))
        .finish();
    format!("/?{}", query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_core::VideoRecord;

    #[test]
    fn test_default_state_links_to_root() {
        let state = ViewState::default();
        let links = ViewerLinks::new(&state);

        assert_eq!(links.close_detail(), "/");
        assert_eq!(links.page(1), "/");
        assert_eq!(links.page(2), "/?page=2");
    }

    #[test]
    fn test_toggle_resets_page_and_keeps_search() {
        let mut state = ViewState::default();
        state.set_search("arm bar");
        state.toggle_tag("gi");
        state.set_page(3);
        let links = ViewerLinks::new(&state);

        assert_eq!(links.toggle_tag("no-gi"), "/?search=arm+bar&tags=gi%2Cno-gi");
        assert_eq!(links.toggle_tag("gi"), "/?search=arm+bar");
        assert_eq!(links.page(4), "/?search=arm+bar&tags=gi&page=4");
    }

    #[test]
    fn test_detail_links() {
        let mut state = ViewState::default();
        state.set_page(2);
        state.select_video(VideoRecord {
            id: "v 9".to_string(),
            ..VideoRecord::default()
        });
        let links = ViewerLinks::new(&state);

        assert_eq!(links.open_video("v1"), "/?page=2&video=v1");
        assert_eq!(links.close_detail(), "/?page=2");
        // paging closes the overlay
        assert_eq!(links.page(3), "/?page=3");
    }
}
