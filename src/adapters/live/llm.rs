//! Live adapter for the `LlmClient` port using the Gemini `generateContent` API.

use std::env;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::ports::llm::{GenerationFuture, GenerationRequest, GenerationResponse, LlmClient};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Live LLM client that calls the Gemini API.
pub struct LiveLlmClient {
    client: Client,
}

impl LiveLlmClient {
    /// Creates a new live LLM client.
    #[must_use]
    pub fn new() -> Self {
        Self { client: Client::new() }
    }
}

impl Default for LiveLlmClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Request body sent to the Gemini `generateContent` endpoint.
#[derive(Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

/// A content entry in the Gemini request.
#[derive(Serialize)]
struct GeminiContent<'a> {
    parts: Vec<GeminiPart<'a>>,
}

/// A single text part.
#[derive(Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

/// Generation parameters.
#[derive(Serialize)]
struct GeminiGenerationConfig {
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
    temperature: f32,
}

/// Top-level response from the Gemini API.
#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(rename = "usageMetadata", default)]
    usage: GeminiUsage,
}

/// A candidate completion in the Gemini response.
#[derive(Deserialize)]
struct GeminiCandidate {
    content: GeminiCandidateContent,
}

/// Content of a candidate.
#[derive(Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

/// A text part in the response.
#[derive(Deserialize)]
struct GeminiResponsePart {
    #[serde(default)]
    text: String,
}

/// Token usage reported by the Gemini API.
#[derive(Deserialize, Default)]
struct GeminiUsage {
    #[serde(rename = "promptTokenCount", default)]
    prompt_tokens: u32,
    #[serde(rename = "candidatesTokenCount", default)]
    completion_tokens: u32,
}

/// Error response from the Gemini API.
#[derive(Deserialize)]
struct GeminiError {
    error: GeminiErrorDetail,
}

/// Detail inside a Gemini error response.
#[derive(Deserialize)]
struct GeminiErrorDetail {
    message: String,
}

impl LlmClient for LiveLlmClient {
    fn generate(&self, request: &GenerationRequest) -> GenerationFuture<'_> {
        let model = request.model.clone();
        let prompt = request.prompt.clone();
        let max_tokens = request.max_tokens;

        Box::pin(async move {
            let api_key = env::var("GEMINI_API_KEY").map_err(|_| {
                Box::<dyn std::error::Error + Send + Sync>::from(
                    "GEMINI_API_KEY environment variable not set",
                )
            })?;

            let body = GeminiRequest {
                contents: vec![GeminiContent { parts: vec![GeminiPart { text: &prompt }] }],
                generation_config: GeminiGenerationConfig {
                    max_output_tokens: max_tokens,
                    temperature: 0.2,
                },
            };

            let url = format!("{GEMINI_API_BASE}/{model}:generateContent?key={api_key}");
            let response = self.client.post(&url).json(&body).send().await.map_err(
                |e| -> Box<dyn std::error::Error + Send + Sync> {
                    format!("Gemini API request failed: {e}").into()
                },
            )?;

            let status = response.status();
            let response_text =
                response.text().await.map_err(|e| -> Box<dyn std::error::Error + Send + Sync> {
                    format!("Failed to read Gemini API response: {e}").into()
                })?;

            if !status.is_success() {
                let msg = serde_json::from_str::<GeminiError>(&response_text)
                    .map(|e| e.error.message)
                    .unwrap_or(response_text);
                // The status code stays in the message so the retry layer
                // can classify 429/504 responses from the text alone.
                return Err(format!("Gemini API error ({}): {msg}", status.as_u16()).into());
            }

            let api_response: GeminiResponse = serde_json::from_str(&response_text).map_err(
                |e| -> Box<dyn std::error::Error + Send + Sync> {
                    format!("Failed to parse Gemini API response: {e}").into()
                },
            )?;

            let text = api_response
                .candidates
                .into_iter()
                .flat_map(|c| c.content.parts)
                .map(|part| part.text)
                .collect::<String>();

            Ok(GenerationResponse {
                text,
                prompt_tokens: api_response.usage.prompt_tokens,
                completion_tokens: api_response.usage.completion_tokens,
            })
        })
    }
}
