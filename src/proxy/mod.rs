//! Generation proxy: an axum service that injects the upstream credential.
//!
//! Routes:
//! - `POST /generate-image`: forward `{ "prompt": ... }` upstream
//! - `GET /healthz`: liveness probe
//!
//! Every response carries permissive CORS headers. Pre-flight `OPTIONS`
//! requests are answered by the CORS layer and never reach a handler.

pub mod handler;

use std::future::Future;
use std::sync::Arc;

use axum::http::header::{ACCESS_CONTROL_ALLOW_HEADERS, AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, HeaderValue};
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::ApiKey;
use crate::ports::ImageUpstream;

/// Value of `Access-Control-Allow-Headers` on every response.
pub const ALLOW_HEADERS: &str = "authorization, x-client-info, apikey, content-type";

/// Immutable state shared by all requests.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Shared>,
}

struct Shared {
    api_key: Option<ApiKey>,
    upstream: Box<dyn ImageUpstream>,
}

impl AppState {
    /// Build state from the credential resolved at startup and an upstream port.
    #[must_use]
    pub fn new(api_key: Option<ApiKey>, upstream: Box<dyn ImageUpstream>) -> Self {
        Self { inner: Arc::new(Shared { api_key, upstream }) }
    }

    /// The server-held credential, if one was configured.
    #[must_use]
    pub fn api_key(&self) -> Option<&ApiKey> {
        self.inner.api_key.as_ref()
    }

    /// The upstream port.
    #[must_use]
    pub fn upstream(&self) -> &dyn ImageUpstream {
        self.inner.upstream.as_ref()
    }
}

/// Assemble the proxy router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers([
        AUTHORIZATION,
        HeaderName::from_static("x-client-info"),
        HeaderName::from_static("apikey"),
        CONTENT_TYPE,
    ]);

    Router::new()
        .route("/generate-image", post(handler::generate_image))
        .route("/healthz", get(healthz))
        .layer(SetResponseHeaderLayer::if_not_present(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOW_HEADERS),
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the proxy on `listener` until `shutdown` resolves.
///
/// # Errors
///
/// Returns an error if the server fails while accepting connections.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(state)).with_graceful_shutdown(shutdown).await
}

async fn healthz() -> &'static str {
    "ok"
}
