//! Proxy port: the coordinator's view of the generation proxy.

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use super::HttpReply;
use crate::error::GenerateError;

/// A validated request from the coordinator to the proxy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Prompt text, exactly as entered.
    pub prompt: String,
}

/// Success body returned by the proxy.
#[derive(Debug, Clone, Deserialize)]
pub struct ProxyResponse {
    /// Generated images; only the first is used.
    pub data: Vec<ImageEntry>,
}

/// One generated image in a proxy response.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageEntry {
    /// Base64-encoded image bytes.
    pub b64_json: String,
}

/// Error body returned by the proxy.
#[derive(Debug, Clone, Deserialize)]
pub struct ProxyErrorBody {
    /// Error message.
    pub error: String,
}

/// Boxed future type returned by [`ProxyClient::send`].
pub type ProxyFuture<'a> =
    Pin<Box<dyn Future<Output = Result<HttpReply, GenerateError>> + Send + 'a>>;

/// Sends generation requests to the proxy.
pub trait ProxyClient: Send + Sync {
    /// Send one request and return the raw reply.
    fn send(&self, request: &GenerationRequest) -> ProxyFuture<'_>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_prompt_only() {
        let request = GenerationRequest { prompt: "a cat".into() };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json, serde_json::json!({ "prompt": "a cat" }));
    }

    #[test]
    fn response_ignores_extra_fields() {
        let body = r#"{"id":"gen-1","data":[{"b64_json":"Zm9v","url":null}]}"#;
        let parsed: ProxyResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.data.len(), 1);
        assert_eq!(parsed.data[0].b64_json, "Zm9v");
    }
}
