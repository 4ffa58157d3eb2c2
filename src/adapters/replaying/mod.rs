//! Replaying adapters that serve recorded interactions from cassettes.

pub mod proxy_client;
pub mod upstream;

use std::sync::Mutex;

use serde::de::DeserializeOwned;

use crate::cassette::replayer::CassetteReplayer;

/// Take the next recorded result for a port and method.
///
/// The outer `Err` means the cassette could not serve the call; the inner
/// result is what was recorded.
pub(crate) fn replay_next<T: DeserializeOwned>(
    replayer: &Mutex<CassetteReplayer>,
    port: &str,
    method: &str,
) -> Result<Result<T, String>, String> {
    let output = {
        let mut guard = replayer.lock().map_err(|e| format!("Replayer lock poisoned: {e}"))?;
        guard.next_interaction(port, method)?.output
    };
    decode_output(output)
}

/// Decode an `Ok`/`Err` output value.
fn decode_output<T: DeserializeOwned>(
    output: serde_json::Value,
) -> Result<Result<T, String>, String> {
    if let Some(err_val) = output.get("Err").or_else(|| output.get("err")) {
        let msg = err_val.as_str().unwrap_or("replayed error").to_string();
        return Ok(Err(msg));
    }
    let ok_val = output.get("Ok").or_else(|| output.get("ok")).cloned().unwrap_or(output);
    serde_json::from_value(ok_val)
        .map(Ok)
        .map_err(|e| format!("Failed to decode replayed output: {e}"))
}
