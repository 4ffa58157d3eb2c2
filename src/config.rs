//! Configuration file loading with environment variable overrides.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Default upstream image generation endpoint.
pub const DEFAULT_UPSTREAM_URL: &str = "https://api.studio.nebius.com/v1/images/generations";

/// Environment variable holding the upstream credential.
pub const API_KEY_ENV: &str = "NEBIUS_API_KEY";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// API key configuration.
    #[serde(default)]
    pub keys: KeysConfig,

    /// Proxy server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Client settings used by `generate`.
    #[serde(default)]
    pub client: ClientConfig,
}

/// API key configuration.
#[derive(Debug, Default, Deserialize)]
pub struct KeysConfig {
    /// Nebius API key.
    pub nebius: Option<String>,
}

/// Proxy server settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address the proxy binds to.
    pub bind: String,
    /// Upstream generation endpoint.
    pub upstream_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: "0.0.0.0:3000".to_string(), upstream_url: DEFAULT_UPSTREAM_URL.to_string() }
    }
}

/// Client settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Full URL of the proxy's generation route.
    pub proxy_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self { proxy_url: "http://127.0.0.1:3000/generate-image".to_string() }
    }
}

impl Config {
    /// Load configuration from the given path, or return defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
        toml::from_str(&contents)
            .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))
    }

    /// Resolve the upstream credential, preferring the environment variable.
    ///
    /// Empty values count as absent.
    #[must_use]
    pub fn nebius_key(&self) -> Option<ApiKey> {
        std::env::var(API_KEY_ENV)
            .ok()
            .or_else(|| self.keys.nebius.clone())
            .and_then(ApiKey::new)
    }
}

/// Server-held secret for the upstream service.
///
/// `Debug` and [`ApiKey::masked`] never reveal more than a short prefix.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a raw key; blank input yields `None`.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            None
        } else {
            Some(Self(raw))
        }
    }

    /// The raw secret, for building the `Authorization` header.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Masked rendering suitable for logs.
    #[must_use]
    pub fn masked(&self) -> String {
        let prefix: String = self.0.chars().take(4).collect();
        if self.0.chars().count() > 8 {
            format!("{prefix}****")
        } else {
            "****".to_string()
        }
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ApiKey").field(&self.masked()).finish()
    }
}

/// Discover the config file path using the resolution order:
/// 1. Explicit path (from `--config` flag)
/// 2. `PROMPTCANVAS_CONFIG` environment variable
/// 3. `~/.config/promptcanvas/config.toml`
#[must_use]
pub fn discover_config_path(explicit: Option<&str>) -> PathBuf {
    if let Some(p) = explicit {
        return PathBuf::from(p);
    }

    if let Ok(p) = std::env::var("PROMPTCANVAS_CONFIG") {
        return PathBuf::from(p);
    }

    default_config_path()
}

fn default_config_path() -> PathBuf {
    if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".config/promptcanvas/config.toml")
    } else {
        PathBuf::from("promptcanvas.toml")
    }
}
