//! Live adapters that talk HTTP.

pub mod nebius;
pub mod proxy_http;
