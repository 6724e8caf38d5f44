//! Viewer server request handlers

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use super::models::{CacheSummary, HealthStatus, ViewerParams};
use super::server::AppState;
use crate::controller::CatalogController;
use crate::render;

/// Handle health check requests
pub async fn health_check(state: &AppState) -> Result<HealthStatus> {
    Ok(HealthStatus {
        status: "healthy".to_string(),
        service: "video-catalog".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        backend: state.client.endpoint().to_string(),
        cache: CacheSummary::from(state.cache.stats()),
    })
}

/// Render the viewer page for the given query parameters.
///
/// Fetch failures are part of the page (error pill), not an error of the handler.
pub async fn render_viewer(state: &AppState, params: &ViewerParams) -> String {
    let view_state = params.view_state(state.config.api.page_size);
    let mut controller =
        CatalogController::new(state.client.clone(), state.cache.clone(), view_state);

    let mut view = controller.settle().await;

    if let Some(id) = params.video_id() {
        if controller.select_video_by_id(id) {
            debug!("Opening detail for video {}", id);
            view.state = controller.state().clone();
        } else {
            warn!("Video {} is not on the requested page", id);
        }
    }

    if let Some(message) = view.query.error_message() {
        warn!("Rendering catalog page with error: {}", message);
    }

    render::render_page(&view, &state.stylesheet)
}

/// Response relayed from the proxy target
#[derive(Debug)]
pub struct ProxiedResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// Forward `path_and_query` to the configured proxy target
pub async fn proxy_request(state: &AppState, path_and_query: &str) -> Result<ProxiedResponse> {
    let target = format!(
        "{}{}",
        state.config.server.proxy_target.trim_end_matches('/'),
        path_and_query
    );
    info!("↪️ Proxying {}", target);

    let response = state
        .http
        .get(&target)
        .send()
        .await
        .with_context(|| format!("Proxy target unreachable: {}", target))?;

    let status = response.status().as_u16();
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let body = response
        .bytes()
        .await
        .context("Failed to read proxied body")?
        .to_vec();

    Ok(ProxiedResponse {
        status,
        content_type,
        body,
    })
}
