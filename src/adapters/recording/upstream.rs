//! Recording adapter for the `ImageUpstream` port.

use std::sync::{Arc, Mutex};

use super::record_result;
use crate::cassette::recorder::CassetteRecorder;
use crate::config::ApiKey;
use crate::ports::upstream::{ImageUpstream, UpstreamFuture, UpstreamRequest};

/// Records upstream exchanges while delegating to an inner implementation.
///
/// Only the request body is recorded, never the key.
pub struct RecordingUpstream {
    inner: Box<dyn ImageUpstream>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingUpstream {
    /// Wrap `inner`, appending every exchange to `recorder`.
    pub fn new(inner: Box<dyn ImageUpstream>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

impl ImageUpstream for RecordingUpstream {
    fn send(&self, key: &ApiKey, request: &UpstreamRequest) -> UpstreamFuture<'_> {
        let key = key.clone();
        let request = request.clone();
        Box::pin(async move {
            let result = self.inner.send(&key, &request).await;
            record_result(&self.recorder, "upstream", "send", &request, &result);
            result
        })
    }
}
