//! Live adapter that calls the generation proxy over HTTP.

use reqwest::Client;

use crate::error::GenerateError;
use crate::ports::proxy_client::{GenerationRequest, ProxyClient, ProxyFuture};
use crate::ports::HttpReply;

/// Proxy client posting `{ "prompt": ... }` to the proxy route.
pub struct HttpProxyClient {
    client: Client,
    url: String,
}

impl HttpProxyClient {
    /// Create a client for the proxy's generation URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self { client: Client::new(), url: url.into() }
    }
}

impl ProxyClient for HttpProxyClient {
    fn send(&self, request: &GenerationRequest) -> ProxyFuture<'_> {
        let request = request.clone();
        Box::pin(async move {
            let response = self
                .client
                .post(&self.url)
                .json(&request)
                .send()
                .await
                .map_err(|e| GenerateError::Network(e.to_string()))?;

            let status = response.status().as_u16();
            let body = response.text().await.map_err(|e| GenerateError::Network(e.to_string()))?;

            Ok(HttpReply { status, body })
        })
    }
}
