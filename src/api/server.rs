//! HTTP server for the catalog viewer

use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::{header, HeaderValue, Method, StatusCode, Uri},
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use catalog_core::CatalogPage;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::time::{interval, Duration};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use super::{handlers, models::ApiResponse, models::ViewerParams, CatalogClient};
use crate::cache::QueryCache;
use crate::config::Config;
use crate::theme::{StyleSheet, Theme};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub client: CatalogClient,
    pub cache: QueryCache<CatalogPage>,
    pub stylesheet: Arc<StyleSheet>,
    /// Client used by the `/api` proxy
    pub http: reqwest::Client,
}

impl AppState {
    /// Wire client, cache and theme from `config`
    pub fn from_config(config: Config) -> Result<Self> {
        let client = CatalogClient::new(config.api_base_url())?;
        let cache = QueryCache::new(config.stale_time());
        let theme = Theme::with_overrides(&config.theme);

        Ok(Self {
            client,
            cache,
            stylesheet: Arc::new(StyleSheet::from_theme(&theme)),
            http: reqwest::Client::new(),
            config: Arc::new(config),
        })
    }
}

/// Build the viewer routes
pub fn router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(viewer_handler))
        .route("/health", get(health_handler))
        .route("/api/*path", get(proxy_handler))
        .with_state(app_state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
}

/// Configure and start the HTTP server
pub async fn start_http_server(app_state: AppState) -> Result<()> {
    let port = app_state.config.server.port;
    info!("🚀 Starting viewer on port {}", port);
    info!("🔗 Catalog backend: {}", app_state.client.endpoint());

    if let Some(max_age) = app_state.config.cleanup_after() {
        spawn_cache_cleanup(app_state.cache.clone(), max_age);
    }

    let listener = TcpListener::bind(SocketAddr::from(([0, 0, 0, 0], port))).await?;
    info!("🌐 Viewer listening on http://0.0.0.0:{}", port);

    serve(listener, app_state).await
}

/// Serve the viewer on an already bound listener
pub async fn serve(listener: TcpListener, app_state: AppState) -> Result<()> {
    axum::serve(listener, router(app_state)).await?;
    Ok(())
}

/// Periodically drop cache entries nobody asked for within `max_age`
fn spawn_cache_cleanup(cache: QueryCache<CatalogPage>, max_age: Duration) {
    tokio::spawn(async move {
        let mut ticker = interval(max_age);
        loop {
            ticker.tick().await;
            let removed = cache.cleanup_unused(max_age);
            if removed > 0 {
                info!("🧹 Dropped {} unused catalog queries", removed);
            }
        }
    });
}

/// Viewer page handler
async fn viewer_handler(
    State(state): State<AppState>,
    Query(params): Query<ViewerParams>,
) -> impl IntoResponse {
    Html(handlers::render_viewer(&state, &params).await)
}

/// Health check handler
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    match handlers::health_check(&state).await {
        Ok(data) => (StatusCode::OK, Json(ApiResponse::success(data))).into_response(),
        Err(e) => {
            let status = StatusCode::INTERNAL_SERVER_ERROR;
            (status, Json(ApiResponse::<()>::error(e.to_string()))).into_response()
        }
    }
}

/// Dev proxy handler forwarding `/api/*` to the proxy target
async fn proxy_handler(State(state): State<AppState>, uri: Uri) -> Response {
    let path_and_query = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());

    match handlers::proxy_request(&state, path_and_query).await {
        Ok(proxied) => {
            let status = StatusCode::from_u16(proxied.status).unwrap_or(StatusCode::BAD_GATEWAY);
            let mut response = (status, proxied.body).into_response();
            if let Some(content_type) = proxied
                .content_type
                .and_then(|value| HeaderValue::from_str(&value).ok())
            {
                response.headers_mut().insert(header::CONTENT_TYPE, content_type);
            }
            response
        }
        Err(e) => {
            warn!("Proxy request failed: {:#}", e);
            (
                StatusCode::BAD_GATEWAY,
                Json(ApiResponse::<()>::error(e.to_string())),
            )
                .into_response()
        }
    }
}
