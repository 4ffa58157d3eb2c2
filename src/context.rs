//! Service context that bundles all port trait objects.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::adapters::live::nebius::NebiusUpstream;
use crate::adapters::live::proxy_http::HttpProxyClient;
use crate::adapters::recording::proxy_client::RecordingProxyClient;
use crate::adapters::recording::upstream::RecordingUpstream;
use crate::adapters::replaying::proxy_client::ReplayingProxyClient;
use crate::adapters::replaying::upstream::ReplayingUpstream;
use crate::cassette::config::load_cassette;
use crate::cassette::recorder::CassetteRecorder;
use crate::error::CliError;
use crate::ports::{ImageUpstream, ProxyClient};

/// Environment variable naming a cassette to replay.
pub const REPLAY_ENV: &str = "PROMPTCANVAS_REPLAY";

/// Environment variable enabling recording mode.
pub const RECORD_ENV: &str = "PROMPTCANVAS_REC";

/// Endpoints the live adapters talk to.
#[derive(Debug, Clone)]
pub struct Endpoints {
    /// Upstream generation URL used by the proxy.
    pub upstream_url: String,
    /// Proxy generation URL used by the coordinator.
    pub proxy_url: String,
}

/// Bundles all port trait objects into a single context.
pub struct ServiceContext {
    /// Upstream port, used by `serve`.
    pub upstream: Box<dyn ImageUpstream>,
    /// Proxy port, used by `generate`.
    pub proxy: Box<dyn ProxyClient>,
}

/// Handle to a recording session that must be finished after use.
pub struct RecordingSession {
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingSession {
    /// Write the cassette recorded so far to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette file cannot be written.
    pub fn finish(self) -> Result<PathBuf, String> {
        let recorder = self.recorder.lock().map_err(|e| format!("Recorder lock poisoned: {e}"))?;
        tracing::info!(interactions = recorder.len(), "writing cassette");
        recorder.write().map_err(|e| format!("Failed to write cassette: {e}"))
    }
}

impl ServiceContext {
    /// Pick live, recording or replaying mode from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a replay cassette cannot be loaded.
    pub fn from_env(endpoints: &Endpoints) -> Result<(Self, Option<RecordingSession>), CliError> {
        if let Ok(cassette_path) = std::env::var(REPLAY_ENV) {
            tracing::info!(cassette = %cassette_path, "replaying from cassette");
            return Ok((Self::replaying(Path::new(&cassette_path))?, None));
        }
        let is_recording =
            std::env::var(RECORD_ENV).is_ok_and(|v| v == "true" || v == "1");
        if is_recording {
            tracing::info!("recording mode enabled");
            let (ctx, session) = Self::recording(endpoints);
            return Ok((ctx, Some(session)));
        }
        Ok((Self::live(endpoints), None))
    }

    /// Create a live context.
    #[must_use]
    pub fn live(endpoints: &Endpoints) -> Self {
        Self {
            upstream: Box::new(NebiusUpstream::new(endpoints.upstream_url.clone())),
            proxy: Box::new(HttpProxyClient::new(endpoints.proxy_url.clone())),
        }
    }

    /// Create a recording context that wraps the live adapters with a recorder.
    #[must_use]
    pub fn recording(endpoints: &Endpoints) -> (Self, RecordingSession) {
        let live = Self::live(endpoints);

        let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H-%M-%S").to_string();
        let path = PathBuf::from(".promptcanvas/cassettes")
            .join(&timestamp)
            .join("promptcanvas.cassette.yaml");
        let recorder = Arc::new(Mutex::new(CassetteRecorder::new(
            path,
            format!("{timestamp}-promptcanvas"),
            get_commit_hash(),
        )));

        let ctx = Self {
            upstream: Box::new(RecordingUpstream::new(live.upstream, Arc::clone(&recorder))),
            proxy: Box::new(RecordingProxyClient::new(live.proxy, Arc::clone(&recorder))),
        };
        (ctx, RecordingSession { recorder })
    }

    /// Create a replaying context from a cassette file.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette file cannot be loaded.
    pub fn replaying(path: &Path) -> Result<Self, CliError> {
        let replayer = load_cassette(path)
            .map_err(|e| CliError::Config(format!("Failed to load cassette: {e}")))?;
        let replayer = Arc::new(Mutex::new(replayer));
        Ok(Self {
            upstream: Box::new(ReplayingUpstream::new(Arc::clone(&replayer))),
            proxy: Box::new(ReplayingProxyClient::new(replayer)),
        })
    }
}

/// Get the current git commit hash, or "unknown" if unavailable.
fn get_commit_hash() -> String {
    std::process::Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map_or_else(|| "unknown".to_string(), |s| s.trim().to_string())
}
