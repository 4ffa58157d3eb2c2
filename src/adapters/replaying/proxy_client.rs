//! Replaying adapter for the `ProxyClient` port.

use std::sync::{Arc, Mutex};

use super::replay_next;
use crate::cassette::replayer::CassetteReplayer;
use crate::error::GenerateError;
use crate::ports::proxy_client::{GenerationRequest, ProxyClient, ProxyFuture};
use crate::ports::HttpReply;

/// Serves recorded proxy replies from a cassette.
pub struct ReplayingProxyClient {
    replayer: Arc<Mutex<CassetteReplayer>>,
}

impl ReplayingProxyClient {
    /// Create a replaying client backed by the given replayer.
    #[must_use]
    pub fn new(replayer: Arc<Mutex<CassetteReplayer>>) -> Self {
        Self { replayer }
    }
}

impl ProxyClient for ReplayingProxyClient {
    fn send(&self, _request: &GenerationRequest) -> ProxyFuture<'_> {
        let result = match replay_next::<HttpReply>(&self.replayer, "proxy", "send") {
            Ok(recorded) => recorded.map_err(GenerateError::Network),
            Err(e) => Err(GenerateError::Replay(e)),
        };
        Box::pin(async move { result })
    }
}
