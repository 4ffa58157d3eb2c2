//! Fixed upstream generation parameters.
//!
//! The proxy exposes none of these to callers; only the prompt varies.

use crate::ports::UpstreamRequest;

/// Upstream model identifier.
pub const MODEL: &str = "black-forest-labs/flux-schnell";

/// Images are returned inline as base64.
pub const RESPONSE_FORMAT: &str = "b64_json";

/// Requested output encoding.
pub const RESPONSE_EXTENSION: &str = "webp";

/// Square output edge in pixels.
pub const IMAGE_EDGE: u32 = 1024;

/// Few steps: latency over fidelity.
pub const INFERENCE_STEPS: u32 = 4;

/// Seed value asking the service to pick one at random.
pub const RANDOM_SEED: i64 = -1;

/// Images requested per call. The coordinator only uses the first.
pub const IMAGE_COUNT: u32 = 2;

/// Build the upstream body for a prompt.
#[must_use]
pub fn upstream_request(prompt: &str) -> UpstreamRequest {
    UpstreamRequest {
        model: MODEL.to_string(),
        response_format: RESPONSE_FORMAT.to_string(),
        response_extension: RESPONSE_EXTENSION.to_string(),
        width: IMAGE_EDGE,
        height: IMAGE_EDGE,
        num_inference_steps: INFERENCE_STEPS,
        negative_prompt: String::new(),
        seed: RANDOM_SEED,
        prompt: prompt.to_string(),
        n: IMAGE_COUNT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_matches_upstream_contract() {
        let body = serde_json::to_value(upstream_request("a red fox in snow")).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "model": "black-forest-labs/flux-schnell",
                "response_format": "b64_json",
                "response_extension": "webp",
                "width": 1024,
                "height": 1024,
                "num_inference_steps": 4,
                "negative_prompt": "",
                "seed": -1,
                "prompt": "a red fox in snow",
                "n": 2
            })
        );
    }

    #[test]
    fn prompt_is_passed_verbatim() {
        let request = upstream_request("  spaced out  ");
        assert_eq!(request.prompt, "  spaced out  ");
    }
}
