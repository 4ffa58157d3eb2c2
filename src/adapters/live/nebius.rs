//! Live adapter for the Nebius image generation API.

use reqwest::Client;

use crate::config::ApiKey;
use crate::error::ProxyError;
use crate::ports::upstream::{ImageUpstream, UpstreamFuture, UpstreamRequest};
use crate::ports::HttpReply;

/// Upstream client that posts to the configured generation endpoint.
pub struct NebiusUpstream {
    client: Client,
    url: String,
}

impl NebiusUpstream {
    /// Create a client for the given endpoint URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self { client: Client::new(), url: url.into() }
    }
}

impl ImageUpstream for NebiusUpstream {
    fn send(&self, key: &ApiKey, request: &UpstreamRequest) -> UpstreamFuture<'_> {
        let request = request.clone();
        let authorization = format!("Bearer {}", key.expose());
        Box::pin(async move {
            let response = self
                .client
                .post(&self.url)
                .header("Accept", "*/*")
                .header("Authorization", authorization)
                .json(&request)
                .send()
                .await
                .map_err(|e| ProxyError::Unreachable(e.to_string()))?;

            let status = response.status().as_u16();
            let body = response.text().await.map_err(|e| ProxyError::Unreachable(e.to_string()))?;

            Ok(HttpReply { status, body })
        })
    }
}
