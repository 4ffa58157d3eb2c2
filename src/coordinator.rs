//! Request coordinator: one in-flight generation with simulated progress.
//!
//! State machine: `idle → busy → idle`. While busy, a ticker raises the
//! displayed progress by a fixed step on a fixed interval, never past the
//! ceiling; 100 is reserved for actual completion. The ticker lives only
//! inside the wait on the proxy call, so it stops on every exit path,
//! including the submit future being dropped.

use std::time::Duration;

use base64::Engine;
use tokio::sync::watch;

use crate::error::GenerateError;
use crate::ports::proxy_client::{GenerationRequest, ProxyClient, ProxyErrorBody, ProxyResponse};
use crate::ports::HttpReply;

/// Encoding of generated images.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageEncoding {
    /// `image/webp`.
    Webp,
}

impl ImageEncoding {
    /// MIME type for `data:` URIs.
    #[must_use]
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Webp => "image/webp",
        }
    }
}

/// A decoded image and the prompt that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    /// Raw image bytes.
    pub data: Vec<u8>,
    /// Image encoding.
    pub encoding: ImageEncoding,
    /// Prompt text, exactly as submitted.
    pub prompt: String,
}

impl GeneratedImage {
    /// Render as `data:<mime>;base64,<payload>`.
    #[must_use]
    pub fn data_uri(&self) -> String {
        let payload = base64::engine::general_purpose::STANDARD.encode(&self.data);
        format!("data:{};base64,{payload}", self.encoding.mime_type())
    }
}

/// Outcome of the latest request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationResult {
    /// The request produced an image.
    Image(GeneratedImage),
    /// The request failed.
    Failed {
        /// Diagnostic message; not meant for end users.
        message: String,
    },
}

/// Observable coordinator state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    /// Whether a request is in flight (or settling).
    pub busy: bool,
    /// Displayed progress percentage.
    pub progress: u8,
    /// Latest result, replaced by each resolved request.
    pub result: Option<GenerationResult>,
}

/// Progress animation constants.
#[derive(Debug, Clone, Copy)]
pub struct ProgressTiming {
    /// Percentage added per tick.
    pub step: u8,
    /// Time between ticks.
    pub interval: Duration,
    /// Highest value the ticker may reach.
    pub ceiling: u8,
    /// How long 100% stays visible before the reset.
    pub settle: Duration,
}

impl Default for ProgressTiming {
    fn default() -> Self {
        Self {
            step: 10,
            interval: Duration::from_millis(500),
            ceiling: 90,
            settle: Duration::from_millis(500),
        }
    }
}

/// Drives one generation request at a time against a proxy.
pub struct Coordinator {
    proxy: Box<dyn ProxyClient>,
    timing: ProgressTiming,
    state: watch::Sender<Snapshot>,
}

impl Coordinator {
    /// Create an idle coordinator with default timing.
    #[must_use]
    pub fn new(proxy: Box<dyn ProxyClient>) -> Self {
        Self::with_timing(proxy, ProgressTiming::default())
    }

    /// Create an idle coordinator with custom timing.
    #[must_use]
    pub fn with_timing(proxy: Box<dyn ProxyClient>, timing: ProgressTiming) -> Self {
        let (state, _) = watch::channel(Snapshot::default());
        Self { proxy, timing, state }
    }

    /// Subscribe to state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.state.subscribe()
    }

    /// Current state.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.state.borrow().clone()
    }

    /// Generate an image for `prompt`.
    ///
    /// Taking `&mut self` keeps a second request from starting while one is
    /// in flight. A blank prompt fails before any state change or network
    /// call; the prompt is otherwise sent exactly as given.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::EmptyPrompt`] for blank input, or the
    /// failure of the proxy call, its status, or its payload.
    pub async fn submit(&mut self, prompt: &str) -> Result<GeneratedImage, GenerateError> {
        if prompt.trim().is_empty() {
            tracing::warn!("rejected blank prompt");
            return Err(GenerateError::EmptyPrompt);
        }

        let request = GenerationRequest { prompt: prompt.to_string() };
        let busy = BusyGuard::acquire(&self.state);

        let outcome =
            self.await_reply(&request).await.and_then(|reply| decode_reply(reply, &request.prompt));

        let recorded = match &outcome {
            Ok(image) => GenerationResult::Image(image.clone()),
            Err(e) => {
                tracing::warn!(error = %e, "generation failed");
                GenerationResult::Failed { message: e.to_string() }
            }
        };
        self.state.send_modify(|s| {
            s.progress = 100;
            s.result = Some(recorded);
        });

        tokio::time::sleep(self.timing.settle).await;
        drop(busy);
        outcome
    }

    /// Wait for the proxy reply while the progress ticker runs.
    async fn await_reply(&self, request: &GenerationRequest) -> Result<HttpReply, GenerateError> {
        let ProgressTiming { step, interval, ceiling, .. } = self.timing;
        let mut call = self.proxy.send(request);
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);

        loop {
            tokio::select! {
                biased;
                reply = &mut call => return reply,
                _ = ticker.tick() => {
                    self.state.send_if_modified(|s| {
                        if s.progress >= ceiling {
                            return false;
                        }
                        s.progress = s.progress.saturating_add(step).min(ceiling);
                        true
                    });
                }
            }
        }
    }
}

/// Marks the coordinator busy for its lifetime; dropping it returns to idle.
struct BusyGuard<'a> {
    state: &'a watch::Sender<Snapshot>,
}

impl<'a> BusyGuard<'a> {
    fn acquire(state: &'a watch::Sender<Snapshot>) -> Self {
        state.send_modify(|s| {
            s.busy = true;
            s.progress = 0;
        });
        Self { state }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.state.send_modify(|s| {
            s.busy = false;
            s.progress = 0;
        });
    }
}

/// Turn a proxy reply into the first generated image.
fn decode_reply(reply: HttpReply, prompt: &str) -> Result<GeneratedImage, GenerateError> {
    if !reply.is_success() {
        let message = serde_json::from_str::<ProxyErrorBody>(&reply.body)
            .map_or(reply.body, |body| body.error);
        return Err(GenerateError::Proxy { status: reply.status, message });
    }

    let parsed: ProxyResponse = serde_json::from_str(&reply.body)
        .map_err(|e| GenerateError::Malformed(format!("Failed to parse response: {e}")))?;
    let first = parsed
        .data
        .into_iter()
        .next()
        .ok_or_else(|| GenerateError::Malformed("No images in response".into()))?;
    let data = base64::engine::general_purpose::STANDARD
        .decode(first.b64_json.as_bytes())
        .map_err(|e| GenerateError::Malformed(format!("Failed to decode base64: {e}")))?;

    Ok(GeneratedImage { data, encoding: ImageEncoding::Webp, prompt: prompt.to_string() })
}
