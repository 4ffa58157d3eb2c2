//! Recording adapter for the `ProxyClient` port.

use std::sync::{Arc, Mutex};

use super::record_result;
use crate::cassette::recorder::CassetteRecorder;
use crate::ports::proxy_client::{GenerationRequest, ProxyClient, ProxyFuture};

/// Records proxy exchanges while delegating to an inner implementation.
pub struct RecordingProxyClient {
    inner: Box<dyn ProxyClient>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingProxyClient {
    /// Wrap `inner`, appending every exchange to `recorder`.
    pub fn new(inner: Box<dyn ProxyClient>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

impl ProxyClient for RecordingProxyClient {
    fn send(&self, request: &GenerationRequest) -> ProxyFuture<'_> {
        let request = request.clone();
        Box::pin(async move {
            let result = self.inner.send(&request).await;
            record_result(&self.recorder, "proxy", "send", &request, &result);
            result
        })
    }
}
