//! LLM client port for text generation.

use std::error::Error;
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

/// Boxed future type alias used by [`LlmClient`] to keep the trait dyn-compatible.
pub type GenerationFuture<'a> = Pin<
    Box<dyn Future<Output = Result<GenerationResponse, Box<dyn Error + Send + Sync>>> + Send + 'a>,
>;

/// A request to generate text from an LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// The model identifier (e.g. `"gemini-1.5-flash"`).
    pub model: String,
    /// The prompt to send.
    pub prompt: String,
    /// Maximum number of tokens to generate.
    pub max_tokens: u32,
}

/// The response from a text generation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// The generated text.
    pub text: String,
    /// Number of prompt tokens consumed.
    pub prompt_tokens: u32,
    /// Number of completion tokens generated.
    pub completion_tokens: u32,
}

/// Sends generation requests to a language model.
///
/// Errors carry the upstream failure text so that the retry layer can
/// classify them (rate limit, deadline, other) from the message alone.
pub trait LlmClient: Send + Sync {
    /// Generates text for the given request.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails (network, auth, rate-limit, etc.).
    fn generate(&self, request: &GenerationRequest) -> GenerationFuture<'_>;
}
