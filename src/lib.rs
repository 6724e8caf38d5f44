/// Video Catalog Viewer
///
/// Search, tag-filter and browse a paginated short-video catalog served by a
/// backend API, with a per-key query cache that keeps the previous page on
/// screen while the next one loads.

pub mod api;
pub mod cache;
pub mod config;
pub mod controller;
pub mod error;
pub mod logging;
pub mod render;
pub mod theme;
pub mod view_state;

// Re-export main types for easy access
pub use crate::api::{CatalogClient, HttpTransport, Transport, TransportResponse};
pub use crate::cache::{Observation, ObservedPhase, QueryCache, QueryObserver, QueryState, QueryStatus};
pub use crate::config::{Config, ConfigBuilder};
pub use crate::controller::{CatalogController, CatalogView};
pub use crate::error::{CatalogError, Result};
pub use crate::theme::{StyleSheet, Theme, ThemeSurface};
pub use crate::view_state::ViewState;
pub use catalog_core::{CatalogPage, FilterSet, QueryKey, TagCount, VideoRecord};

#[cfg(feature = "server")]
pub use crate::api::server::{start_http_server, AppState};
