//! Replaying adapter for the `LlmClient` port.

use std::sync::Mutex;

use super::extract_result;
use crate::cassette::replayer::CassetteReplayer;
use crate::ports::llm::{GenerationFuture, GenerationRequest, GenerationResponse, LlmClient};

/// Serves recorded model responses from a cassette.
pub struct ReplayingLlmClient {
    replayer: Mutex<CassetteReplayer>,
}

impl ReplayingLlmClient {
    /// Creates a new replaying client from a cassette replayer.
    #[must_use]
    pub fn new(replayer: CassetteReplayer) -> Self {
        Self { replayer: Mutex::new(replayer) }
    }
}

impl LlmClient for ReplayingLlmClient {
    fn generate(&self, _request: &GenerationRequest) -> GenerationFuture<'_> {
        let result = {
            let mut replayer = self.replayer.lock().expect("replayer lock poisoned");
            let interaction = replayer.next_interaction("llm", "generate");
            extract_result(&interaction.output, "llm", "generate")
        };
        Box::pin(async move {
            match result {
                Ok(value) => {
                    let response: GenerationResponse = serde_json::from_value(value)
                        .expect("recorded generate output is not a valid response");
                    Ok(response)
                }
                Err(message) => Err(message.into()),
            }
        })
    }
}
