//! `POST /generate-image` handler.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;

use super::AppState;
use crate::error::ProxyError;
use crate::params::upstream_request;

#[derive(Deserialize)]
struct PromptBody {
    prompt: String,
}

/// Forward the caller's prompt upstream and pass the reply through.
pub async fn generate_image(State(state): State<AppState>, body: Bytes) -> Response {
    match forward(&state, &body).await {
        Ok(payload) => ([(header::CONTENT_TYPE, "application/json")], payload).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Run one generation and return the upstream body unmodified.
async fn forward(state: &AppState, body: &[u8]) -> Result<String, ProxyError> {
    let PromptBody { prompt } =
        serde_json::from_slice(body).map_err(|e| ProxyError::InvalidRequest(e.to_string()))?;
    let key = state.api_key().ok_or(ProxyError::MissingApiKey)?;

    tracing::info!(%prompt, "starting image generation");
    let request = upstream_request(&prompt);
    tracing::debug!(?request, "sending upstream request");

    let reply = state.upstream().send(key, &request).await?;
    if !reply.is_success() {
        return Err(ProxyError::Upstream { status: reply.status, body: reply.body });
    }

    let count = image_count(&reply.body)?;
    tracing::info!(count, "received upstream response");
    if count == 0 {
        return Err(ProxyError::NoImages);
    }
    Ok(reply.body)
}

/// Number of entries in the payload's `data` array; a missing array counts as zero.
fn image_count(body: &str) -> Result<usize, ProxyError> {
    let payload: serde_json::Value =
        serde_json::from_str(body).map_err(|e| ProxyError::MalformedUpstream(e.to_string()))?;
    Ok(payload.get("data").and_then(serde_json::Value::as_array).map_or(0, Vec::len))
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        match &self {
            Self::Upstream { status, body } => tracing::error!(status, %body, "upstream error"),
            other => tracing::error!(error = %other, "generation failed"),
        }
        let status =
            StatusCode::from_u16(self.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use reqwest::{Method, StatusCode};
    use serde_json::{json, Value};

    use super::*;
    use crate::config::ApiKey;
    use crate::ports::upstream::{ImageUpstream, UpstreamFuture, UpstreamRequest};
    use crate::ports::HttpReply;
    use crate::proxy::{router, ALLOW_HEADERS};

    type Calls = Arc<Mutex<Vec<(String, UpstreamRequest)>>>;

    /// Upstream double returning a canned reply, or a transport error when `None`.
    struct FakeUpstream {
        reply: Option<HttpReply>,
        calls: Calls,
    }

    impl ImageUpstream for FakeUpstream {
        fn send(&self, key: &ApiKey, request: &UpstreamRequest) -> UpstreamFuture<'_> {
            self.calls.lock().unwrap().push((key.expose().to_string(), request.clone()));
            let result = self
                .reply
                .clone()
                .ok_or_else(|| ProxyError::Unreachable("connection refused".into()));
            Box::pin(async move { result })
        }
    }

    async fn spawn_proxy(key: Option<&str>, reply: Option<HttpReply>) -> (String, Calls) {
        let calls = Calls::default();
        let upstream = FakeUpstream { reply, calls: Arc::clone(&calls) };
        let state = AppState::new(key.and_then(ApiKey::new), Box::new(upstream));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router(state)).await.unwrap() });
        (format!("http://{addr}"), calls)
    }

    fn ok_reply(body: &str) -> Option<HttpReply> {
        Some(HttpReply { status: 200, body: body.into() })
    }

    async fn post_prompt(base: &str, prompt: &str) -> reqwest::Response {
        reqwest::Client::new()
            .post(format!("{base}/generate-image"))
            .json(&json!({ "prompt": prompt }))
            .send()
            .await
            .unwrap()
    }

    fn assert_cors(response: &reqwest::Response) {
        let headers = response.headers();
        assert_eq!(headers["access-control-allow-origin"], "*");
        assert_eq!(headers["access-control-allow-headers"], ALLOW_HEADERS);
    }

    #[tokio::test]
    async fn preflight_returns_before_credential_or_upstream() {
        let (base, calls) = spawn_proxy(None, None).await;

        let response = reqwest::Client::new()
            .request(Method::OPTIONS, format!("{base}/generate-image"))
            .header("Origin", "http://localhost:5173")
            .header("Access-Control-Request-Method", "POST")
            .header("Access-Control-Request-Headers", "content-type, x-client-info")
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
        let allowed = response.headers()["access-control-allow-headers"].to_str().unwrap();
        for name in ["authorization", "x-client-info", "apikey", "content-type"] {
            assert!(allowed.contains(name), "missing {name} in {allowed}");
        }
        assert!(response.text().await.unwrap().is_empty());
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn success_passes_upstream_body_through() {
        let upstream_body = r#"{"id":"gen-1","data":[{"b64_json":"Zm9v"},{"b64_json":"YmFy"}]}"#;
        let (base, calls) = spawn_proxy(Some("secret-key"), ok_reply(upstream_body)).await;

        let response = post_prompt(&base, "a red fox in snow").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_cors(&response);
        assert_eq!(response.headers()["content-type"], "application/json");
        assert_eq!(response.text().await.unwrap(), upstream_body);

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (key, request) = &calls[0];
        assert_eq!(key, "secret-key");
        assert_eq!(request, &upstream_request("a red fox in snow"));
        assert_eq!(request.width, 1024);
        assert_eq!(request.height, 1024);
        assert_eq!(request.n, 2);
    }

    #[tokio::test]
    async fn missing_key_fails_without_upstream_call() {
        let (base, calls) = spawn_proxy(None, ok_reply(r#"{"data":[{"b64_json":"Zm9v"}]}"#)).await;

        let response = post_prompt(&base, "a cat").await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_cors(&response);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body, json!({ "error": "API key not found" }));
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn caller_authorization_is_not_used_as_credential() {
        let (base, calls) = spawn_proxy(None, ok_reply(r#"{"data":[{"b64_json":"Zm9v"}]}"#)).await;

        let response = reqwest::Client::new()
            .post(format!("{base}/generate-image"))
            .header("Authorization", "Bearer caller-supplied")
            .json(&json!({ "prompt": "a cat" }))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn upstream_failure_maps_to_generic_error() {
        let reply = Some(HttpReply { status: 500, body: "quota exceeded".into() });
        let (base, calls) = spawn_proxy(Some("secret-key"), reply).await;

        let response = post_prompt(&base, "a cat").await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_cors(&response);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body, json!({ "error": "Failed to generate images" }));
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn empty_data_is_not_a_success() {
        let (base, _) = spawn_proxy(Some("secret-key"), ok_reply(r#"{"data":[]}"#)).await;

        let response = post_prompt(&base, "a cat").await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body, json!({ "error": "No images were generated" }));
    }

    #[tokio::test]
    async fn missing_data_field_is_not_a_success() {
        let (base, _) = spawn_proxy(Some("secret-key"), ok_reply(r#"{"id":"gen-1"}"#)).await;

        let response = post_prompt(&base, "a cat").await;

        let body: Value = response.json().await.unwrap();
        assert_eq!(body, json!({ "error": "No images were generated" }));
    }

    #[tokio::test]
    async fn non_json_upstream_body_is_malformed() {
        let (base, _) = spawn_proxy(Some("secret-key"), ok_reply("<html>")).await;

        let response = post_prompt(&base, "a cat").await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = response.json().await.unwrap();
        assert!(body["error"].as_str().unwrap().starts_with("Malformed upstream response"));
    }

    #[tokio::test]
    async fn unreachable_upstream_is_server_error() {
        let (base, calls) = spawn_proxy(Some("secret-key"), None).await;

        let response = post_prompt(&base, "a cat").await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_cors(&response);
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn invalid_body_is_rejected_before_upstream() {
        let (base, calls) = spawn_proxy(Some("secret-key"), ok_reply("{}")).await;

        let response = reqwest::Client::new()
            .post(format!("{base}/generate-image"))
            .header("Content-Type", "application/json")
            .body("{\"text\": 1}")
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_cors(&response);
        let body: Value = response.json().await.unwrap();
        assert!(body["error"].as_str().unwrap().starts_with("Invalid request body"));
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn healthz_answers_ok() {
        let (base, _) = spawn_proxy(None, None).await;
        let response = reqwest::get(format!("{base}/healthz")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.text().await.unwrap(), "ok");
    }

    #[test]
    fn image_count_reads_data_array() {
        assert_eq!(image_count(r#"{"data":[{},{}]}"#).unwrap(), 2);
        assert_eq!(image_count(r#"{"data":null}"#).unwrap(), 0);
        assert!(image_count("not json").is_err());
    }
}
