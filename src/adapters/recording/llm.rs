//! Recording adapter for the `LlmClient` port.

use std::sync::{Arc, Mutex};

use super::record_result;
use crate::cassette::recorder::CassetteRecorder;
use crate::ports::llm::{GenerationFuture, GenerationRequest, LlmClient};

/// Records model calls while delegating to an inner client.
pub struct RecordingLlmClient {
    inner: Box<dyn LlmClient>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingLlmClient {
    /// Creates a new recording client wrapping the given implementation.
    pub fn new(inner: Box<dyn LlmClient>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

impl LlmClient for RecordingLlmClient {
    fn generate(&self, request: &GenerationRequest) -> GenerationFuture<'_> {
        let request_clone = request.clone();
        Box::pin(async move {
            let result = self.inner.generate(&request_clone).await;
            record_result(&self.recorder, "llm", "generate", &request_clone, &result);
            result
        })
    }
}
