//! Replaying adapters that serve recorded interactions from cassettes.

pub mod clock;
pub mod filesystem;
pub mod llm;
pub mod sleeper;

pub use clock::ReplayingClock;
pub use filesystem::ReplayingFileSystem;
pub use llm::ReplayingLlmClient;
pub use sleeper::ReplayingSleeper;

use serde_json::Value;

/// Unwrap a recorded `{"ok": v}` / `{"err": "msg"}` output into a `Result`.
///
/// # Panics
///
/// Panics if the output matches neither convention, which indicates a
/// corrupt or hand-edited cassette.
pub(crate) fn extract_result(output: &Value, port: &str, method: &str) -> Result<Value, String> {
    if let Some(ok) = output.get("ok") {
        return Ok(ok.clone());
    }
    if let Some(err) = output.get("err") {
        return Err(err.as_str().map_or_else(|| err.to_string(), str::to_string));
    }
    panic!(
        "Recorded output for port={port:?} method={method:?} is neither {{\"ok\": ..}} \
         nor {{\"err\": ..}}: {output}"
    );
}
