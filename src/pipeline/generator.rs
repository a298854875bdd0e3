//! Weekly pulse orchestration: theme data in, persisted pulse out.

use crate::config::PipelineConfig;
use crate::context::ServiceContext;
use crate::model::{PulseRecord, TaggedReview, WeekThemeData};
use crate::pipeline::assembler::{word_count, PulseAssembler};
use crate::pipeline::summarizer::ThemeSummarizer;
use crate::store::ReviewStore;

/// Generates, persists and returns the weekly pulse for one week of
/// classified theme data.
pub struct WeeklyPulseGenerator<'a> {
    ctx: &'a ServiceContext,
    config: &'a PipelineConfig,
}

impl<'a> WeeklyPulseGenerator<'a> {
    /// Creates a new generator.
    #[must_use]
    pub fn new(ctx: &'a ServiceContext, config: &'a PipelineConfig) -> Self {
        Self { ctx, config }
    }

    /// Generate the pulse for a week.
    ///
    /// Idempotent: when a persisted pulse already exists and `force` is
    /// false it is loaded and returned without any model calls. A
    /// persisted pulse that fails to parse is regenerated.
    ///
    /// # Errors
    ///
    /// Returns an error if the week has no top themes, or if the
    /// finished pulse cannot be persisted.
    pub async fn generate(
        &self,
        week_key: &str,
        theme_data: &WeekThemeData,
        force: bool,
    ) -> Result<PulseRecord, String> {
        let store = ReviewStore::new(self.ctx, &self.config.data_dir);

        if !force && store.pulse_exists(week_key) {
            match store.load_pulse(week_key) {
                Ok(existing) => {
                    println!("Pulse for week {week_key} already exists, skipping generation");
                    return Ok(existing);
                }
                Err(e) => {
                    eprintln!("warning: existing pulse for {week_key} unreadable, regenerating: {e}");
                }
            }
        }

        if theme_data.top_themes.is_empty() {
            return Err(format!("No top themes available for week {week_key}"));
        }

        let top_3: Vec<_> = theme_data.top_themes.iter().take(3).cloned().collect();

        // Group the tagged reviews by top theme, preserving ranking order.
        let summarizer = ThemeSummarizer::new(self.ctx, self.config);
        let mut summaries = Vec::with_capacity(top_3.len());
        for entry in &top_3 {
            let group: Vec<TaggedReview> = theme_data
                .reviews
                .iter()
                .filter(|r| r.theme.as_deref() == Some(entry.theme.as_str()))
                .cloned()
                .collect();
            if group.is_empty() {
                continue;
            }
            summaries.push(summarizer.summarize(&entry.theme, &group).await);
        }

        let assembler = PulseAssembler::new(self.ctx, self.config);
        let pulse = assembler
            .assemble(
                week_key,
                &theme_data.week_start_date,
                &theme_data.week_end_date,
                &summaries,
                &top_3,
            )
            .await;

        let record = PulseRecord {
            week_key: week_key.to_string(),
            week_start_date: theme_data.week_start_date.clone(),
            week_end_date: theme_data.week_end_date.clone(),
            generated_at: self.ctx.clock.now(),
            total_reviews: theme_data.total_reviews,
            top_3_themes: top_3,
            word_count: word_count(&pulse),
            pulse,
        };

        store.save_pulse(&record)?;
        println!(
            "Generated pulse for week {week_key}: {} words across {} themes",
            record.word_count,
            record.pulse.themes.len()
        );
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cassette::config::CassetteConfig;
    use crate::model::ThemeCount;
    use crate::pipeline::executor::test_support::{CountingSleeper, ScriptedLlm};
    use crate::store::test_fs::MemFs;
    use std::collections::BTreeMap;

    struct FixedClock;
    impl crate::ports::clock::Clock for FixedClock {
        fn now(&self) -> chrono::DateTime<chrono::Utc> {
            "2025-06-09T08:00:00Z".parse().unwrap()
        }
    }

    fn base_context() -> ServiceContext {
        let mut ctx = ServiceContext::replaying_from(&CassetteConfig::panic_on_unspecified())
            .expect("panic config should always succeed");
        ctx.fs = Box::new(MemFs::new());
        ctx.clock = Box::new(FixedClock);
        ctx.sleeper = Box::new(CountingSleeper::new());
        ctx
    }

    fn tagged(id: &str, theme: &str) -> TaggedReview {
        TaggedReview {
            review_id: id.to_string(),
            title: String::new(),
            text: "A review body long enough to matter".to_string(),
            date: "2025-06-03T09:00:00Z".parse().unwrap(),
            theme: Some(theme.to_string()),
            theme_reason: Some("test".to_string()),
        }
    }

    fn theme_data() -> WeekThemeData {
        WeekThemeData {
            week_key: "2025-06-02".into(),
            week_start_date: "2025-06-02".into(),
            week_end_date: "2025-06-08".into(),
            total_reviews: 2,
            theme_counts: BTreeMap::from([
                ("Trading Experience".to_string(), 1),
                ("Support & Service Quality".to_string(), 1),
            ]),
            top_themes: vec![
                ThemeCount { theme: "Trading Experience".into(), count: 1 },
                ThemeCount { theme: "Support & Service Quality".into(), count: 1 },
            ],
            reviews: vec![tagged("r1", "Trading Experience"), tagged("r2", "Support & Service Quality")],
        }
    }

    fn chunk_json(theme: &str) -> String {
        serde_json::json!({
            "theme": theme,
            "key_points": ["A point"],
            "candidate_quotes": ["\"a quote\""],
        })
        .to_string()
    }

    fn pulse_json() -> String {
        serde_json::json!({
            "title": "Pulse",
            "overview": "Short overview.",
            "themes": [
                {"name": "Trading Experience", "summary": "Fine."},
                {"name": "Support & Service Quality", "summary": "Slow."},
            ],
            "quotes": ["\"a\"", "\"b\"", "\"c\""],
            "actions": ["Do one", "Do two", "Do three"]
        })
        .to_string()
    }

    #[tokio::test]
    async fn generates_and_persists_a_pulse() {
        let mut ctx = base_context();
        // Two summarize calls (one per populated theme) plus synthesis.
        ctx.llm = Box::new(ScriptedLlm::new(vec![
            Ok(chunk_json("Trading Experience")),
            Ok(chunk_json("Support & Service Quality")),
            Ok(pulse_json()),
        ]));
        let config = PipelineConfig::default();
        let generator = WeeklyPulseGenerator::new(&ctx, &config);

        let record = generator.generate("2025-06-02", &theme_data(), false).await.unwrap();

        assert_eq!(record.week_key, "2025-06-02");
        assert_eq!(record.generated_at.to_rfc3339(), "2025-06-09T08:00:00+00:00");
        assert_eq!(record.top_3_themes.len(), 2);
        assert!(record.word_count <= 250);

        let store = ReviewStore::new(&ctx, &config.data_dir);
        assert!(store.pulse_exists("2025-06-02"));
        let loaded = store.load_pulse("2025-06-02").unwrap();
        assert_eq!(loaded.pulse.title, record.pulse.title);
    }

    #[tokio::test]
    async fn existing_pulse_skips_model_entirely() {
        let mut ctx = base_context();
        let llm = ScriptedLlm::new(vec![
            Ok(chunk_json("Trading Experience")),
            Ok(chunk_json("Support & Service Quality")),
            Ok(pulse_json()),
        ]);
        let calls = llm.call_counter();
        ctx.llm = Box::new(llm);
        let config = PipelineConfig::default();
        let generator = WeeklyPulseGenerator::new(&ctx, &config);

        let first = generator.generate("2025-06-02", &theme_data(), false).await.unwrap();
        let calls_after_first = calls.load(std::sync::atomic::Ordering::SeqCst);

        let second = generator.generate("2025-06-02", &theme_data(), false).await.unwrap();
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), calls_after_first);
        assert_eq!(serde_json::to_string(&first).unwrap(), serde_json::to_string(&second).unwrap());
    }

    #[tokio::test]
    async fn week_without_top_themes_is_an_error() {
        let ctx = base_context();
        let config = PipelineConfig::default();
        let generator = WeeklyPulseGenerator::new(&ctx, &config);

        let mut data = theme_data();
        data.top_themes.clear();

        let result = generator.generate("2025-06-02", &data, false).await;
        assert!(result.unwrap_err().contains("No top themes"));
    }
}
