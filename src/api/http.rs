use super::{Transport, TransportResponse};
use crate::error::Result;
use async_trait::async_trait;
use tracing::debug;
use url::Url;

/// reqwest-backed transport.
///
/// No request timeout is configured; a fetch ends when the server answers or
/// the connection fails.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("video-catalog/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &Url) -> Result<TransportResponse> {
        debug!("GET {}", url);

        let response = self.client.get(url.clone()).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;

        Ok(TransportResponse::new(status, body.to_vec()))
    }
}
