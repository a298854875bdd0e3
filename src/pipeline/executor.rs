//! Retrying prompt execution shared by every pipeline stage.
//!
//! One execution path handles all three failure families: transient
//! service errors retry with classified backoff, unparseable output
//! retries immediately, and exhaustion degrades to a caller-supplied
//! fallback value. Callers never see a raw transport error.

use std::time::Duration;

use crate::config::PipelineConfig;
use crate::context::ServiceContext;
use crate::ports::GenerationRequest;

/// Classification of a service error message, driving the backoff
/// strategy for the next retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Quota or rate-limit rejection; waits a fixed, longer delay.
    RateLimit,
    /// Upstream deadline exceeded; exponential backoff.
    Deadline,
    /// Anything else; exponential backoff.
    Other,
}

/// Classify a service error by the markers the upstream API puts in
/// its messages.
#[must_use]
pub fn classify_error(message: &str) -> ErrorClass {
    let lower = message.to_ascii_lowercase();
    if message.contains("429")
        || lower.contains("quota")
        || lower.contains("rate limit")
        || message.contains("ResourceExhausted")
    {
        return ErrorClass::RateLimit;
    }
    if message.contains("504") || message.contains("DeadlineExceeded") {
        return ErrorClass::Deadline;
    }
    ErrorClass::Other
}

/// Executes prompts against the model port with retry, backoff and
/// fallback. Stateless; all knobs come from the config.
pub struct PromptExecutor<'a> {
    ctx: &'a ServiceContext,
    config: &'a PipelineConfig,
}

impl<'a> PromptExecutor<'a> {
    /// Creates a new executor over the given context and config.
    #[must_use]
    pub fn new(ctx: &'a ServiceContext, config: &'a PipelineConfig) -> Self {
        Self { ctx, config }
    }

    /// Run a prompt and parse its response, retrying up to the
    /// configured attempt count.
    ///
    /// Service errors wait out a classified delay before the next
    /// attempt; a response `parse` rejects retries immediately. When
    /// all attempts are spent, `fallback` supplies the result, so this
    /// never fails.
    pub async fn execute<T>(
        &self,
        prompt: &str,
        label: &str,
        parse: impl Fn(&str) -> Option<T>,
        fallback: impl FnOnce() -> T,
    ) -> T {
        let max_attempts = self.config.retry_attempts.max(1);

        for attempt in 1..=max_attempts {
            let request = GenerationRequest {
                model: self.config.model.clone(),
                prompt: prompt.to_string(),
                max_tokens: self.config.max_tokens,
            };

            match self.ctx.llm.generate(&request).await {
                Ok(response) => {
                    if let Some(value) = parse(&response.text) {
                        return value;
                    }
                    eprintln!(
                        "warning: unparseable response for {label} \
                         (attempt {attempt}/{max_attempts})"
                    );
                }
                Err(e) => {
                    let message = e.to_string();
                    if attempt < max_attempts {
                        let delay = self.retry_delay(&message, attempt);
                        eprintln!(
                            "warning: {label} failed (attempt {attempt}/{max_attempts}): \
                             {message}. Waiting {}s before retry",
                            delay.as_secs()
                        );
                        self.ctx.sleeper.sleep(delay).await;
                    } else {
                        eprintln!(
                            "error: max retries reached for {label}, using fallback: {message}"
                        );
                    }
                }
            }
        }

        fallback()
    }

    /// Wait the configured inter-batch delay. Callers insert this
    /// between consecutive batches or chunks, never after the last.
    pub async fn pause_between_batches(&self) {
        self.ctx.sleeper.sleep(self.config.batch_delay).await;
    }

    fn retry_delay(&self, message: &str, attempt: u32) -> Duration {
        match classify_error(message) {
            ErrorClass::RateLimit => self.config.rate_limit_delay,
            ErrorClass::Deadline | ErrorClass::Other => {
                self.config.retry_delay_base * 2u32.pow(attempt - 1)
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{CountingSleeper, ScriptedLlm};
    use super::*;
    use crate::cassette::config::CassetteConfig;

    fn test_context() -> ServiceContext {
        ServiceContext::replaying_from(&CassetteConfig::panic_on_unspecified())
            .expect("panic config should always succeed")
    }

    fn test_config() -> PipelineConfig {
        PipelineConfig {
            retry_attempts: 3,
            retry_delay_base: Duration::from_secs(2),
            rate_limit_delay: Duration::from_secs(15),
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn classifies_error_markers() {
        assert_eq!(classify_error("HTTP 429 Too Many Requests"), ErrorClass::RateLimit);
        assert_eq!(classify_error("Quota exceeded for project"), ErrorClass::RateLimit);
        assert_eq!(classify_error("rate limit hit"), ErrorClass::RateLimit);
        assert_eq!(classify_error("ResourceExhausted: try later"), ErrorClass::RateLimit);
        assert_eq!(classify_error("Gemini API error (504): timeout"), ErrorClass::Deadline);
        assert_eq!(classify_error("DeadlineExceeded"), ErrorClass::Deadline);
        assert_eq!(classify_error("connection reset by peer"), ErrorClass::Other);
    }

    #[tokio::test]
    async fn returns_parsed_value_on_first_success() {
        let llm = ScriptedLlm::new(vec![Ok("42".to_string())]);
        let calls = llm.call_counter();
        let mut ctx = test_context();
        ctx.llm = Box::new(llm);
        // A first-attempt success must never sleep.
        ctx.sleeper = Box::new(crate::context::PanickingSleeper);
        let config = test_config();
        let executor = PromptExecutor::new(&ctx, &config);

        let value = executor
            .execute("prompt", "test", |text| text.parse::<u32>().ok(), || 0)
            .await;
        assert_eq!(value, 42);
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn service_errors_back_off_exponentially_then_fall_back() {
        let mut ctx = test_context();
        ctx.llm = Box::new(ScriptedLlm::new(vec![
            Err("boom".to_string()),
            Err("boom".to_string()),
            Err("boom".to_string()),
        ]));
        let sleeper = CountingSleeper::new();
        let delays = sleeper.delay_log();
        ctx.sleeper = Box::new(sleeper);
        let config = test_config();
        let executor = PromptExecutor::new(&ctx, &config);

        let value = executor
            .execute("prompt", "test", |text| text.parse::<u32>().ok(), || 99)
            .await;
        assert_eq!(value, 99);

        // 2s then 4s; no delay after the final attempt.
        assert_eq!(*delays.lock().unwrap(), vec![Duration::from_secs(2), Duration::from_secs(4)]);
    }

    #[tokio::test]
    async fn rate_limit_errors_wait_the_fixed_delay() {
        let mut ctx = test_context();
        ctx.llm = Box::new(ScriptedLlm::new(vec![
            Err("Gemini API error (429): quota".to_string()),
            Ok("7".to_string()),
        ]));
        let sleeper = CountingSleeper::new();
        let delays = sleeper.delay_log();
        ctx.sleeper = Box::new(sleeper);
        let config = test_config();
        let executor = PromptExecutor::new(&ctx, &config);

        let value = executor
            .execute("prompt", "test", |text| text.parse::<u32>().ok(), || 0)
            .await;
        assert_eq!(value, 7);
        assert_eq!(*delays.lock().unwrap(), vec![Duration::from_secs(15)]);
    }

    #[tokio::test]
    async fn parse_failures_retry_without_delay() {
        let mut ctx = test_context();
        ctx.llm = Box::new(ScriptedLlm::new(vec![
            Ok("garbage".to_string()),
            Ok("5".to_string()),
        ]));
        let sleeper = CountingSleeper::new();
        let delays = sleeper.delay_log();
        ctx.sleeper = Box::new(sleeper);
        let config = test_config();
        let executor = PromptExecutor::new(&ctx, &config);

        let value = executor
            .execute("prompt", "test", |text| text.parse::<u32>().ok(), || 0)
            .await;
        assert_eq!(value, 5);
        assert!(delays.lock().unwrap().is_empty());
    }
}
