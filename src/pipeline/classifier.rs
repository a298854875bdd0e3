//! Review classification (map stage 1): raw reviews to theme assignments.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::config::PipelineConfig;
use crate::context::ServiceContext;
use crate::model::{Review, ThemeAssignment, ThemeCount};
use crate::pipeline::batch::split_batches;
use crate::pipeline::executor::PromptExecutor;
use crate::pipeline::parser::{parse_assignment_lines, parse_records, ParsedRecords, RawAssignment};
use crate::pipeline::prompts::classification_prompt;
use crate::themes::ThemeCatalog;

/// Classifies reviews into catalog themes in bounded batches, with a
/// guardrail pass guaranteeing every classified review gets exactly
/// one valid assignment.
pub struct Classifier<'a> {
    ctx: &'a ServiceContext,
    config: &'a PipelineConfig,
    catalog: &'a ThemeCatalog,
}

impl<'a> Classifier<'a> {
    /// Creates a new classifier.
    #[must_use]
    pub fn new(
        ctx: &'a ServiceContext,
        config: &'a PipelineConfig,
        catalog: &'a ThemeCatalog,
    ) -> Self {
        Self { ctx, config, catalog }
    }

    /// Classify reviews into themes.
    ///
    /// Reviews shorter than the configured minimum are excluded from the
    /// output entirely. Every remaining review appears exactly once: the
    /// guardrail pass substitutes the fallback theme for anything the
    /// model misses, mislabels, or errors out on.
    pub async fn classify(&self, reviews: &[Review], batch_label: &str) -> Vec<ThemeAssignment> {
        let valid: Vec<&Review> = reviews
            .iter()
            .filter(|r| r.text.trim().chars().count() >= self.config.min_review_length)
            .collect();

        if valid.is_empty() {
            println!("No reviews long enough to classify for {batch_label}");
            return Vec::new();
        }

        let batches = split_batches(&valid, self.config.classify_batch_size);
        println!(
            "Classifying {} reviews for {batch_label} in {} batches",
            valid.len(),
            batches.len()
        );

        let executor = PromptExecutor::new(self.ctx, self.config);
        let mut assignments = Vec::with_capacity(valid.len());
        let batch_count = batches.len();

        for (idx, batch) in batches.into_iter().enumerate() {
            let label = format!("{batch_label}_batch_{}", idx + 1);
            let prompt = classification_prompt(self.catalog, batch);

            let parsed: Option<Vec<RawAssignment>> = executor
                .execute(
                    &prompt,
                    &label,
                    |text| Some(Some(self.parse_response(text))),
                    || None,
                )
                .await;

            match parsed {
                Some(records) => {
                    assignments.extend(apply_guardrails(&records, batch, self.catalog));
                }
                // Every retry failed; the whole batch degrades to the
                // fallback theme.
                None => {
                    assignments.extend(batch.iter().map(|review| ThemeAssignment {
                        review_id: review.review_id.clone(),
                        chosen_theme: self.catalog.fallback().to_string(),
                        short_reason: "Fallback classification due to LLM error".to_string(),
                    }));
                }
            }

            if idx + 1 < batch_count {
                executor.pause_between_batches().await;
            }
        }

        println!("Classified {} reviews for {batch_label}", assignments.len());
        assignments
    }

    /// Parse a classification response: JSON cascade first, then the
    /// line heuristic. An unparseable response yields an empty list and
    /// lets the guardrails fill in fallbacks.
    fn parse_response(&self, text: &str) -> Vec<RawAssignment> {
        match parse_records(text) {
            ParsedRecords::Parsed(values) => values
                .into_iter()
                .filter_map(|v: Value| serde_json::from_value(v).ok())
                .collect(),
            ParsedRecords::Empty => parse_assignment_lines(text, self.catalog),
        }
    }
}

/// Guardrail pass: match parsed assignments to the batch's reviews by
/// id and guarantee one valid assignment per review.
#[must_use]
pub fn apply_guardrails(
    parsed: &[RawAssignment],
    reviews: &[&Review],
    catalog: &ThemeCatalog,
) -> Vec<ThemeAssignment> {
    let by_id: BTreeMap<&str, &RawAssignment> =
        parsed.iter().map(|a| (a.review_id.as_str(), a)).collect();

    reviews
        .iter()
        .map(|review| {
            let id = review.review_id.as_str();
            match by_id.get(id) {
                Some(raw) => {
                    let theme = raw.chosen_theme.trim();
                    if catalog.is_valid(theme) {
                        ThemeAssignment {
                            review_id: id.to_string(),
                            chosen_theme: theme.to_string(),
                            short_reason: if raw.short_reason.is_empty() {
                                "No reason provided".to_string()
                            } else {
                                raw.short_reason.clone()
                            },
                        }
                    } else {
                        ThemeAssignment {
                            review_id: id.to_string(),
                            chosen_theme: catalog.fallback().to_string(),
                            short_reason: format!(
                                "Fallback applied: invalid theme '{}'",
                                raw.chosen_theme
                            ),
                        }
                    }
                }
                None => ThemeAssignment {
                    review_id: id.to_string(),
                    chosen_theme: catalog.fallback().to_string(),
                    short_reason: "Fallback: LLM did not classify this review".to_string(),
                },
            }
        })
        .collect()
}

/// Count assignments per theme, keyed by theme name.
#[must_use]
pub fn aggregate_theme_counts(assignments: &[ThemeAssignment]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for assignment in assignments {
        *counts.entry(assignment.chosen_theme.clone()).or_insert(0) += 1;
    }
    counts
}

/// Top themes by count descending, ties broken by name ascending, at
/// most `max_themes` entries.
#[must_use]
pub fn top_themes_by_count(assignments: &[ThemeAssignment], max_themes: usize) -> Vec<ThemeCount> {
    let counts = aggregate_theme_counts(assignments);
    let mut ranked: Vec<ThemeCount> =
        counts.into_iter().map(|(theme, count)| ThemeCount { theme, count }).collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.theme.cmp(&b.theme)));
    ranked.truncate(max_themes);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cassette::config::CassetteConfig;
    use crate::pipeline::executor::test_support::{CountingSleeper, ScriptedLlm};

    fn review(id: &str, text: &str) -> Review {
        Review {
            review_id: id.to_string(),
            title: String::new(),
            text: text.to_string(),
            date: "2025-06-02T09:00:00Z".parse().unwrap(),
        }
    }

    fn raw(id: &str, theme: &str, reason: &str) -> RawAssignment {
        RawAssignment {
            review_id: id.to_string(),
            chosen_theme: theme.to_string(),
            short_reason: reason.to_string(),
        }
    }

    fn scripted_context(script: Vec<Result<String, String>>) -> ServiceContext {
        let mut ctx = ServiceContext::replaying_from(&CassetteConfig::panic_on_unspecified())
            .expect("panic config should always succeed");
        ctx.llm = Box::new(ScriptedLlm::new(script));
        ctx.sleeper = Box::new(CountingSleeper::new());
        ctx
    }

    #[test]
    fn guardrails_cover_every_review() {
        let catalog = ThemeCatalog::default();
        let r1 = review("r1", "Orders are fast and reliable");
        let r42 = review("r42", "Cannot withdraw my money at all");
        let reviews = vec![&r1, &r42];

        // The model only answered for r1.
        let parsed = vec![raw("r1", "Trading Experience", "speed")];
        let out = apply_guardrails(&parsed, &reviews, &catalog);

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].chosen_theme, "Trading Experience");
        assert_eq!(out[1].review_id, "r42");
        assert_eq!(out[1].chosen_theme, "App Performance & Reliability");
        assert_eq!(out[1].short_reason, "Fallback: LLM did not classify this review");
    }

    #[test]
    fn guardrails_substitute_invalid_themes() {
        let catalog = ThemeCatalog::default();
        let r1 = review("r1", "The helpdesk never responds to tickets");
        let parsed = vec![raw("r1", "Customer Happiness", "support complaint")];

        let out = apply_guardrails(&parsed, &[&r1], &catalog);
        assert_eq!(out[0].chosen_theme, "App Performance & Reliability");
        assert!(out[0].short_reason.contains("invalid theme 'Customer Happiness'"));
    }

    #[test]
    fn guardrails_are_idempotent() {
        let catalog = ThemeCatalog::default();
        let r1 = review("r1", "Charts load slowly on open");
        let r2 = review("r2", "SIP redemption took two weeks");
        let reviews = vec![&r1, &r2];

        let first = apply_guardrails(&[raw("r1", "Trading Experience", "charts")], &reviews, &catalog);
        let as_raw: Vec<RawAssignment> = first
            .iter()
            .map(|a| raw(&a.review_id, &a.chosen_theme, &a.short_reason))
            .collect();
        let second = apply_guardrails(&as_raw, &reviews, &catalog);

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn classify_filters_short_reviews_and_covers_the_rest() {
        let catalog = ThemeCatalog::default();
        let config = PipelineConfig::default();
        let ctx = scripted_context(vec![Ok(
            r#"[{"review_id": "r1", "chosen_theme": "Trading Experience", "short_reason": "speed"}]"#
                .to_string(),
        )]);

        let reviews = vec![
            review("r1", "Order execution is consistently fast"),
            review("r2", "ok"), // below the 20-char minimum
        ];

        let classifier = Classifier::new(&ctx, &config, &catalog);
        let out = classifier.classify(&reviews, "test").await;

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].review_id, "r1");
    }

    #[tokio::test]
    async fn classify_issues_one_call_per_batch() {
        let catalog = ThemeCatalog::default();
        let config = PipelineConfig { classify_batch_size: 30, ..PipelineConfig::default() };

        // 95 reviews -> 4 batches of 30/30/30/5; model returns an empty
        // array each time so guardrails fill everything.
        let script: Vec<Result<String, String>> = (0..4).map(|_| Ok("[]".to_string())).collect();
        let llm = ScriptedLlm::new(script);
        let calls = llm.call_counter();
        let mut ctx = ServiceContext::replaying_from(&CassetteConfig::panic_on_unspecified())
            .expect("panic config should always succeed");
        ctx.llm = Box::new(llm);
        let sleeper = CountingSleeper::new();
        let delays = sleeper.delay_log();
        ctx.sleeper = Box::new(sleeper);

        let reviews: Vec<Review> = (0..95)
            .map(|i| review(&format!("r{i}"), "A review body long enough to classify"))
            .collect();

        let classifier = Classifier::new(&ctx, &config, &catalog);
        let out = classifier.classify(&reviews, "test").await;

        assert_eq!(out.len(), 95);
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 4);
        // Inter-batch delay between batches only, never after the last.
        assert_eq!(delays.lock().unwrap().len(), 3);
        assert!(out.iter().all(|a| a.chosen_theme == "App Performance & Reliability"));
    }

    #[tokio::test]
    async fn exhausted_retries_degrade_to_fallback_batch() {
        let catalog = ThemeCatalog::default();
        let config = PipelineConfig { retry_attempts: 2, ..PipelineConfig::default() };
        let ctx = scripted_context(vec![
            Err("Gemini API error (500): internal".to_string()),
            Err("Gemini API error (500): internal".to_string()),
        ]);

        let reviews = vec![review("r1", "Deposits keep failing through UPI")];
        let classifier = Classifier::new(&ctx, &config, &catalog);
        let out = classifier.classify(&reviews, "test").await;

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].chosen_theme, "App Performance & Reliability");
        assert_eq!(out[0].short_reason, "Fallback classification due to LLM error");
    }

    #[test]
    fn top_themes_sorted_by_count_then_name() {
        let assignments = vec![
            ThemeAssignment {
                review_id: "r1".into(),
                chosen_theme: "Support & Service Quality".into(),
                short_reason: String::new(),
            },
            ThemeAssignment {
                review_id: "r2".into(),
                chosen_theme: "Trading Experience".into(),
                short_reason: String::new(),
            },
            ThemeAssignment {
                review_id: "r3".into(),
                chosen_theme: "Trading Experience".into(),
                short_reason: String::new(),
            },
            ThemeAssignment {
                review_id: "r4".into(),
                chosen_theme: "App Performance & Reliability".into(),
                short_reason: String::new(),
            },
        ];

        let top = top_themes_by_count(&assignments, 3);
        assert_eq!(top[0].theme, "Trading Experience");
        assert_eq!(top[0].count, 2);
        // Tie between the two single-count themes breaks alphabetically.
        assert_eq!(top[1].theme, "App Performance & Reliability");
        assert_eq!(top[2].theme, "Support & Service Quality");
    }
}
