#![cfg(feature = "server")]

use axum::{extract::Query, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use std::collections::HashMap;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use video_catalog::api::server::serve;
use video_catalog::{AppState, CatalogClient, CatalogError, ConfigBuilder, FilterSet, HttpTransport};

async fn fake_videos(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
    if params.get("search").map(String::as_str) == Some("explode") {
        return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response();
    }

    let page: u32 = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    Json(serde_json::json!({
        "items": [
            {
                "id": format!("v{}", page),
                "summary": format!("Search: {}", params.get("search").cloned().unwrap_or_default()),
                "tags": ["guard", "sweep"],
                "signedUrl": "https://cdn.example.com/v.mp4",
                "createdAt": "2024-01-02T03:04:05Z"
            }
        ],
        "total": 45,
        "page": page,
        "pageSize": 20
    }))
    .into_response()
}

async fn spawn(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

async fn spawn_backend() -> SocketAddr {
    spawn(Router::new().route("/api/videos", get(fake_videos))).await
}

async fn spawn_viewer(backend: SocketAddr) -> SocketAddr {
    let config = ConfigBuilder::new()
        .with_proxy_target(format!("http://{}", backend))
        .with_theme_override("accent", "#123456")
        .build();
    let state = AppState::from_config(config).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        serve(listener, state).await.unwrap();
    });
    addr
}

#[tokio::test]
async fn test_http_transport_against_backend() {
    let backend = spawn_backend().await;
    let client = CatalogClient::with_transport(
        &format!("http://{}", backend),
        std::sync::Arc::new(HttpTransport::new().unwrap()),
    )
    .unwrap();

    let page = client
        .fetch(&FilterSet::builder().search("armbar").page(2).build())
        .await
        .unwrap();
    assert_eq!(page.items[0].id, "v2");
    assert_eq!(page.items[0].summary, "Search: armbar");
    assert_eq!(page.tag_counts.get("guard"), Some(&1));

    let err = client
        .fetch(&FilterSet::builder().search("explode").build())
        .await
        .unwrap_err();
    assert_eq!(err, CatalogError::FetchFailure { status: 500 });
}

#[tokio::test]
async fn test_viewer_page_renders_catalog() {
    let viewer = spawn_viewer(spawn_backend().await).await;

    let html = reqwest::get(format!("http://{}/?search=kimura&tags=guard&page=2&video=v2", viewer))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert!(html.contains("--accent: #123456;"));
    assert!(html.contains("Search: kimura"));
    assert!(html.contains("Showing 45 videos"));
    assert!(html.contains("Page 2 of 3"));
    assert!(html.contains("aria-label=\"Video details\""));
    assert!(html.contains("2024-01-02 03:04 UTC"));
}

#[tokio::test]
async fn test_viewer_page_shows_backend_failure() {
    let viewer = spawn_viewer(spawn_backend().await).await;

    let response = reqwest::get(format!("http://{}/?search=explode", viewer))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let html = response.text().await.unwrap();
    assert!(html.contains("Unable to load videos (500)"));
}

#[tokio::test]
async fn test_health_and_proxy() {
    let viewer = spawn_viewer(spawn_backend().await).await;

    let health: serde_json::Value = reqwest::get(format!("http://{}/health", viewer))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["success"], true);
    assert_eq!(health["data"]["status"], "healthy");

    let proxied = reqwest::get(format!("http://{}/api/videos?page=3", viewer))
        .await
        .unwrap();
    assert_eq!(proxied.status(), 200);
    assert!(proxied
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .starts_with("application/json"));
    let body: serde_json::Value = proxied.json().await.unwrap();
    assert_eq!(body["items"][0]["id"], "v3");

    let missing = reqwest::get(format!("http://{}/api/nothing", viewer))
        .await
        .unwrap();
    assert_eq!(missing.status(), 404);
}
