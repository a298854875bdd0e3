//! Per-theme summarization (map stage 2): review chunks to key points
//! and candidate quotes.

use std::collections::HashSet;

use serde::Deserialize;

use crate::config::PipelineConfig;
use crate::context::ServiceContext;
use crate::model::{TaggedReview, ThemeSummary};
use crate::pipeline::batch::split_batches;
use crate::pipeline::executor::PromptExecutor;
use crate::pipeline::parser::parse_object;
use crate::pipeline::prompts::chunk_summary_prompt;

const MAX_KEY_POINTS: usize = 10;
const MAX_QUOTES: usize = 5;

/// What one chunk-summary call extracts. Fields default so a partial
/// object still deserializes.
#[derive(Debug, Deserialize)]
struct ChunkExtract {
    #[serde(default)]
    key_points: Vec<String>,
    #[serde(default)]
    candidate_quotes: Vec<String>,
}

/// Summarizes one theme's reviews chunk by chunk, accumulating and
/// deduplicating key points and quotes.
pub struct ThemeSummarizer<'a> {
    ctx: &'a ServiceContext,
    config: &'a PipelineConfig,
}

impl<'a> ThemeSummarizer<'a> {
    /// Creates a new summarizer.
    #[must_use]
    pub fn new(ctx: &'a ServiceContext, config: &'a PipelineConfig) -> Self {
        Self { ctx, config }
    }

    /// Summarize a theme's reviews into at most ten key points and five
    /// quotes. Empty input (or input with no usable text) short-circuits
    /// to an empty summary without calling the model. A chunk that
    /// exhausts its retries is skipped; the remaining chunks still
    /// contribute.
    pub async fn summarize(&self, theme: &str, reviews: &[TaggedReview]) -> ThemeSummary {
        let texts: Vec<&str> =
            reviews.iter().map(|r| r.text.trim()).filter(|t| !t.is_empty()).collect();

        if texts.is_empty() {
            println!("No usable review texts for theme '{theme}'");
            return ThemeSummary {
                theme: theme.to_string(),
                key_points: Vec::new(),
                candidate_quotes: Vec::new(),
            };
        }

        let chunks = split_batches(&texts, self.config.chunk_size);
        println!("Summarizing theme '{theme}': {} reviews in {} chunks", texts.len(), chunks.len());

        let executor = PromptExecutor::new(self.ctx, self.config);
        let chunk_count = chunks.len();
        let mut key_points = Vec::new();
        let mut quotes = Vec::new();

        for (idx, chunk) in chunks.into_iter().enumerate() {
            let label = format!("theme '{theme}' chunk {}/{chunk_count}", idx + 1);
            let prompt = chunk_summary_prompt(theme, chunk);

            let extract: Option<ChunkExtract> = executor
                .execute(&prompt, &label, |text| parse_chunk(text).map(Some), || None)
                .await;

            if let Some(extract) = extract {
                key_points.extend(extract.key_points);
                quotes.extend(extract.candidate_quotes);
            } else {
                eprintln!("warning: skipping unrecoverable {label}");
            }

            if idx + 1 < chunk_count {
                executor.pause_between_batches().await;
            }
        }

        let key_points = dedup_truncate(key_points, MAX_KEY_POINTS);
        let candidate_quotes = dedup_truncate(quotes, MAX_QUOTES);
        println!(
            "Theme '{theme}': {} key points, {} candidate quotes",
            key_points.len(),
            candidate_quotes.len()
        );

        ThemeSummary { theme: theme.to_string(), key_points, candidate_quotes }
    }
}

fn parse_chunk(text: &str) -> Option<ChunkExtract> {
    let value = parse_object(text)?;
    serde_json::from_value(value).ok()
}

/// Order-preserving dedup, capped at `limit` entries.
fn dedup_truncate(items: Vec<String>, limit: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for item in items {
        if seen.insert(item.clone()) {
            out.push(item);
            if out.len() == limit {
                break;
            }
        }
    }
    out
}
