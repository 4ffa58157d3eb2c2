//! Upstream port: the third-party image generation API behind the proxy.

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use super::HttpReply;
use crate::config::ApiKey;
use crate::error::ProxyError;

/// Body sent to the upstream generation endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpstreamRequest {
    /// Upstream model identifier.
    pub model: String,
    /// How images are embedded in the response (`"b64_json"`).
    pub response_format: String,
    /// Requested image encoding (`"webp"`).
    pub response_extension: String,
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Diffusion step count.
    pub num_inference_steps: u32,
    /// Negative prompt text.
    pub negative_prompt: String,
    /// Sampling seed; `-1` lets the service pick one.
    pub seed: i64,
    /// Caller-supplied prompt.
    pub prompt: String,
    /// Number of images requested.
    pub n: u32,
}

/// Boxed future type returned by [`ImageUpstream::send`].
pub type UpstreamFuture<'a> =
    Pin<Box<dyn Future<Output = Result<HttpReply, ProxyError>> + Send + 'a>>;

/// Sends generation requests to the upstream service.
///
/// Implementations return `Err` only when no reply was obtained at all;
/// non-success statuses come back as an [`HttpReply`].
pub trait ImageUpstream: Send + Sync {
    /// Send one request authorised with `key`.
    fn send(&self, key: &ApiKey, request: &UpstreamRequest) -> UpstreamFuture<'_>;
}
