//! Pipeline configuration loaded from the environment.

use std::path::PathBuf;
use std::time::Duration;

/// Tunable knobs for the pipeline: model selection, batching, retry
/// cadence and storage layout. Everything has a sensible default so a
/// bare environment still runs.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Model identifier passed to the generation API.
    pub model: String,
    /// Maximum output tokens per generation call.
    pub max_tokens: u32,
    /// Reviews per classification batch.
    pub classify_batch_size: usize,
    /// Reviews per summarization chunk.
    pub chunk_size: usize,
    /// Attempts per model call before falling back.
    pub retry_attempts: u32,
    /// Base delay for exponential backoff.
    pub retry_delay_base: Duration,
    /// Pause between consecutive batches or chunks.
    pub batch_delay: Duration,
    /// Fixed delay after a rate-limit error.
    pub rate_limit_delay: Duration,
    /// Minimum trimmed review length worth classifying, in characters.
    pub min_review_length: usize,
    /// Cap on reviews processed per week; zero means unlimited.
    pub max_reviews_per_week: usize,
    /// Word budget for an assembled pulse document.
    pub max_pulse_words: usize,
    /// Root directory for review, theme and pulse files.
    pub data_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model: "gemini-1.5-flash".to_string(),
            max_tokens: 4096,
            classify_batch_size: 100,
            chunk_size: 30,
            retry_attempts: 3,
            retry_delay_base: Duration::from_secs(2),
            batch_delay: Duration::from_secs(2),
            rate_limit_delay: Duration::from_secs(15),
            min_review_length: 20,
            max_reviews_per_week: 0,
            max_pulse_words: 250,
            data_dir: PathBuf::from("data"),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset or unparseable. Reads a `.env` file
    /// first if one is present.
    #[must_use]
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        Self {
            model: env_string("GEMINI_MODEL", defaults.model),
            max_tokens: env_parsed("LLM_MAX_TOKENS", defaults.max_tokens),
            classify_batch_size: env_parsed("LLM_BATCH_SIZE", defaults.classify_batch_size),
            chunk_size: env_parsed("REVIEWS_PER_CHUNK", defaults.chunk_size),
            retry_attempts: env_parsed("LLM_RETRY_ATTEMPTS", defaults.retry_attempts),
            retry_delay_base: env_secs("LLM_RETRY_DELAY_BASE", defaults.retry_delay_base),
            batch_delay: env_secs("LLM_BATCH_DELAY", defaults.batch_delay),
            rate_limit_delay: env_secs("LLM_RATE_LIMIT_DELAY", defaults.rate_limit_delay),
            min_review_length: env_parsed("MIN_REVIEW_LENGTH", defaults.min_review_length),
            max_reviews_per_week: env_parsed("MAX_REVIEWS_PER_WEEK", defaults.max_reviews_per_week),
            max_pulse_words: env_parsed("MAX_PULSE_WORDS", defaults.max_pulse_words),
            data_dir: PathBuf::from(env_string(
                "DATA_DIR",
                defaults.data_dir.display().to_string(),
            )),
        }
    }
}

fn env_string(key: &str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_secs(key: &str, default: Duration) -> Duration {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).map_or(default, Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = PipelineConfig::default();
        assert_eq!(config.classify_batch_size, 100);
        assert_eq!(config.chunk_size, 30);
        assert_eq!(config.retry_attempts, 3);
        assert_eq!(config.retry_delay_base, Duration::from_secs(2));
        assert_eq!(config.rate_limit_delay, Duration::from_secs(15));
        assert_eq!(config.min_review_length, 20);
        assert_eq!(config.max_pulse_words, 250);
        assert_eq!(config.data_dir, PathBuf::from("data"));
    }

    #[test]
    fn unparseable_values_fall_back_to_defaults() {
        assert_eq!(env_parsed("PULSE_TEST_UNSET_VAR", 42_usize), 42);
    }
}
