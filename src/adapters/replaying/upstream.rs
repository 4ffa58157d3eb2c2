//! Replaying adapter for the `ImageUpstream` port.

use std::sync::{Arc, Mutex};

use super::replay_next;
use crate::cassette::replayer::CassetteReplayer;
use crate::config::ApiKey;
use crate::error::ProxyError;
use crate::ports::upstream::{ImageUpstream, UpstreamFuture, UpstreamRequest};
use crate::ports::HttpReply;

/// Serves recorded upstream replies from a cassette.
pub struct ReplayingUpstream {
    replayer: Arc<Mutex<CassetteReplayer>>,
}

impl ReplayingUpstream {
    /// Create a replaying upstream backed by the given replayer.
    #[must_use]
    pub fn new(replayer: Arc<Mutex<CassetteReplayer>>) -> Self {
        Self { replayer }
    }
}

impl ImageUpstream for ReplayingUpstream {
    fn send(&self, _key: &ApiKey, _request: &UpstreamRequest) -> UpstreamFuture<'_> {
        let result = match replay_next::<HttpReply>(&self.replayer, "upstream", "send") {
            Ok(recorded) => recorded.map_err(ProxyError::Unreachable),
            Err(e) => Err(ProxyError::Unreachable(e)),
        };
        Box::pin(async move { result })
    }
}
