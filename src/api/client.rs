//! Remote fetch adapter for `/api/videos`

use std::sync::Arc;

use catalog_core::{CatalogPage, FilterSet, RawCatalogPage};
use tracing::{debug, warn};
use url::Url;

use super::{HttpTransport, Transport};
use crate::error::{CatalogError, Result};

/// Path of the catalog listing endpoint, relative to the API base URL
pub const VIDEOS_PATH: &str = "/api/videos";

/// Client for the catalog listing endpoint
#[derive(Clone)]
pub struct CatalogClient {
    endpoint: Url,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for CatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogClient")
            .field("endpoint", &self.endpoint.as_str())
            .finish_non_exhaustive()
    }
}

impl CatalogClient {
    /// Create a client using the reqwest transport
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_transport(base_url, Arc::new(HttpTransport::new()?))
    }

    /// Create a client on top of a custom transport
    pub fn with_transport(base_url: &str, transport: Arc<dyn Transport>) -> Result<Self> {
        let endpoint = Url::parse(&format!("{}{}", base_url.trim_end_matches('/'), VIDEOS_PATH))?;

        if endpoint.cannot_be_a_base() {
            return Err(CatalogError::InvalidUrl(base_url.to_string()));
        }

        Ok(Self {
            endpoint,
            transport,
        })
    }

    /// The listing endpoint without query parameters
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Full request URL for a filter set
    pub fn request_url(&self, filters: &FilterSet) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().extend_pairs(filters.query_pairs());
        url
    }

    /// Fetch and normalize one catalog page
    pub async fn fetch(&self, filters: &FilterSet) -> Result<CatalogPage> {
        let url = self.request_url(filters);
        let response = self.transport.get(&url).await?;

        if !response.is_success() {
            warn!("Catalog API returned {} for {}", response.status, url);
            return Err(CatalogError::FetchFailure {
                status: response.status,
            });
        }

        let page = parse_catalog_page(&response.body)?;
        debug!(
            "📚 Loaded {} of {} videos (page {})",
            page.items.len(),
            page.total,
            page.page
        );

        Ok(page)
    }
}

/// Parse a `/api/videos` body, deriving any tag statistics the backend left out
pub fn parse_catalog_page(body: &[u8]) -> Result<CatalogPage> {
    let raw: RawCatalogPage = serde_json::from_slice(body)?;
    Ok(raw.into())
}
