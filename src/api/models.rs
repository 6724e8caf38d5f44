//! Viewer server data models

use serde::{Deserialize, Serialize};

use crate::cache::CacheStats;
use crate::view_state::ViewState;

/// API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

/// Health document served at `/health`
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: String,
    pub backend: String,
    pub cache: CacheSummary,
}

/// Cache counters exposed in the health document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSummary {
    pub entries: usize,
    pub fresh: usize,
    pub stale: usize,
    pub in_flight: usize,
    pub failed: usize,
}

impl From<CacheStats> for CacheSummary {
    fn from(stats: CacheStats) -> Self {
        Self {
            entries: stats.total_entries,
            fresh: stats.fresh_entries,
            stale: stats.stale_entries,
            in_flight: stats.in_flight,
            failed: stats.failed_entries,
        }
    }
}

/// Query parameters of the viewer page
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ViewerParams {
    #[serde(default)]
    pub search: Option<String>,
    /// Comma-separated tag list
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub page: Option<String>,
    /// Id of the record to open in the detail overlay
    #[serde(default)]
    pub video: Option<String>,
}

impl ViewerParams {
    /// View state described by these parameters; malformed pages fall back to 1
    pub fn view_state(&self, page_size: u32) -> ViewState {
        let mut state = ViewState::new(page_size);

        if let Some(tags) = &self.tags {
            for tag in tags.split(',').map(str::trim).filter(|t| !t.is_empty()) {
                if !state.is_selected(tag) {
                    state.toggle_tag(tag);
                }
            }
        }

        if let Some(search) = &self.search {
            state.set_search(search.trim());
        }

        let page = self
            .page
            .as_deref()
            .and_then(|p| p.trim().parse::<u32>().ok())
            .filter(|p| *p > 0)
            .unwrap_or(1);
        state.set_page(page);

        state
    }

    /// Requested detail record id, if any
    pub fn video_id(&self) -> Option<&str> {
        self.video.as_deref().filter(|id| !id.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_to_view_state() {
        let params = ViewerParams {
            search: Some(" triangle ".to_string()),
            tags: Some("gi, no-gi,,gi".to_string()),
            page: Some("3".to_string()),
            video: Some(String::new()),
        };

        let state = params.view_state(20);
        assert_eq!(state.search(), "triangle");
        assert_eq!(state.selected_tags(), ["gi", "no-gi"]);
        assert_eq!(state.page(), 3);
        assert_eq!(params.video_id(), None);
    }

    #[test]
    fn test_bad_page_falls_back_to_first() {
        for page in ["0", "-2", "abc"] {
            let params = ViewerParams {
                page: Some(page.to_string()),
                ..ViewerParams::default()
            };
            assert_eq!(params.view_state(20).page(), 1);
        }
    }

    #[test]
    fn test_api_response_shape() {
        let body = serde_json::to_value(ApiResponse::<()>::error("boom".to_string())).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "boom");
    }
}
