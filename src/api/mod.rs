//! API module for the video catalog
//!
//! The fetch adapter (`client`) talks to the catalog backend through the
//! [`Transport`] trait; `server` exposes the rendered viewer and the `/api`
//! dev proxy over HTTP.

pub mod client;
pub mod http;
pub mod models;

#[cfg(feature = "server")]
pub mod handlers;
#[cfg(feature = "server")]
pub mod server;

use async_trait::async_trait;
use url::Url;

use crate::error::Result;

pub use client::CatalogClient;
pub use http::HttpTransport;

/// Status and body of a completed HTTP exchange
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// True for 2xx statuses
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Trait for the HTTP layer underneath the catalog client
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a GET request and return whatever the server answered.
    ///
    /// Only failures to obtain a response at all are errors; non-success
    /// statuses are returned as-is.
    async fn get(&self, url: &Url) -> Result<TransportResponse>;
}
