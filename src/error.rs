//! Error types for the proxy, the coordinator and the binary.

use std::fmt;

use thiserror::Error;

/// Failures on the proxy side of a generation request.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The caller's body was not a `{ "prompt": string }` object.
    #[error("Invalid request body: {0}")]
    InvalidRequest(String),

    /// No server-side credential was configured.
    #[error("API key not found")]
    MissingApiKey,

    /// The upstream service answered with a non-success status.
    #[error("Failed to generate images")]
    Upstream {
        /// HTTP status code returned upstream.
        status: u16,
        /// Raw upstream body, kept for diagnostics only.
        body: String,
    },

    /// The upstream service could not be reached.
    #[error("Upstream unreachable: {0}")]
    Unreachable(String),

    /// The upstream answered 2xx with a body that is not JSON.
    #[error("Malformed upstream response: {0}")]
    MalformedUpstream(String),

    /// The upstream answered 2xx without any image entries.
    #[error("No images were generated")]
    NoImages,
}

impl ProxyError {
    /// HTTP status the proxy answers with for this error.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            Self::InvalidRequest(_) => 400,
            _ => 500,
        }
    }
}

/// Failures on the client side of a generation request.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// The prompt was empty or whitespace only.
    #[error("Prompt is empty")]
    EmptyPrompt,

    /// The proxy could not be reached.
    #[error("Network error: {0}")]
    Network(String),

    /// The proxy answered with a non-success status.
    #[error("Proxy error ({status}): {message}")]
    Proxy {
        /// HTTP status code.
        status: u16,
        /// Error message reported by the proxy.
        message: String,
    },

    /// The proxy answered 2xx with an unusable payload.
    #[error("Malformed proxy response: {0}")]
    Malformed(String),

    /// A replayed interaction could not be served.
    #[error("Replay error: {0}")]
    Replay(String),
}

impl GenerateError {
    /// Collapse the error to what the user is shown.
    #[must_use]
    pub fn notice(&self) -> Notice {
        match self {
            Self::EmptyPrompt => Notice::EnterPrompt,
            _ => Notice::Failed,
        }
    }
}

/// User-facing outcome messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// Shown when submit is attempted with a blank prompt.
    EnterPrompt,
    /// Shown for every failure after validation.
    Failed,
    /// Shown when an image was generated.
    Generated,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::EnterPrompt => "Please enter a prompt first",
            Self::Failed => "Failed to generate image. Please try again.",
            Self::Generated => "Image generated successfully!",
        };
        f.write_str(text)
    }
}

/// Errors surfaced by the `promptcanvas` binary.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration or cassette setup failed.
    #[error("Config error: {0}")]
    Config(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The proxy server stopped with an error.
    #[error("Server error: {0}")]
    Serve(String),

    /// Generation failed; only the user notice is displayed.
    #[error("{}", .0.notice())]
    Generate(#[from] GenerateError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_error_hides_body_in_message() {
        let err = ProxyError::Upstream { status: 500, body: "quota exceeded".into() };
        assert_eq!(err.to_string(), "Failed to generate images");
        assert_eq!(err.status(), 500);
    }

    #[test]
    fn invalid_request_is_client_error() {
        assert_eq!(ProxyError::InvalidRequest("eof".into()).status(), 400);
        assert_eq!(ProxyError::MissingApiKey.status(), 500);
        assert_eq!(ProxyError::NoImages.status(), 500);
    }

    #[test]
    fn notices_collapse_to_two_outcomes() {
        assert_eq!(GenerateError::EmptyPrompt.notice(), Notice::EnterPrompt);
        assert_eq!(GenerateError::Network("refused".into()).notice(), Notice::Failed);
        assert_eq!(
            GenerateError::Proxy { status: 500, message: "API key not found".into() }.notice(),
            Notice::Failed
        );
        assert_eq!(GenerateError::Malformed("no images".into()).notice(), Notice::Failed);
    }

    #[test]
    fn cli_generate_error_shows_only_notice() {
        let err = CliError::from(GenerateError::Proxy {
            status: 500,
            message: "Failed to generate images".into(),
        });
        assert_eq!(err.to_string(), "Failed to generate image. Please try again.");
        let err = CliError::from(GenerateError::EmptyPrompt);
        assert_eq!(err.to_string(), "Please enter a prompt first");
    }
}
