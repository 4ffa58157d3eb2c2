//! Port traits defining external boundaries.
//!
//! Each trait represents a boundary between the application core and an
//! external HTTP service. Implementations live in `src/adapters/`.

pub mod proxy_client;
pub mod upstream;

use serde::{Deserialize, Serialize};

pub use proxy_client::ProxyClient;
pub use upstream::{ImageUpstream, UpstreamRequest};

/// Raw outcome of one HTTP exchange.
///
/// Adapters never interpret the status; the core decides what counts as
/// success so replayed exchanges go through the same checks as live ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpReply {
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

impl HttpReply {
    /// Whether the status is in the 2xx range.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_range() {
        let reply = |status| HttpReply { status, body: String::new() };
        assert!(reply(200).is_success());
        assert!(reply(204).is_success());
        assert!(!reply(199).is_success());
        assert!(!reply(302).is_success());
        assert!(!reply(500).is_success());
    }
}
