//! Weekly classification orchestration: raw reviews in, persisted
//! theme data out.

use std::collections::BTreeMap;

use crate::config::PipelineConfig;
use crate::context::ServiceContext;
use crate::model::{Review, TaggedReview, ThemeAssignment, ThemeCount, WeekThemeData};
use crate::pipeline::classifier::{aggregate_theme_counts, top_themes_by_count, Classifier};
use crate::store::{week_end_date, ReviewStore};
use crate::themes::ThemeCatalog;

/// Outcome of classifying one week.
#[derive(Debug, Clone)]
pub struct WeekReport {
    /// Week this report covers.
    pub week_key: String,
    /// Reviews loaded for the week after capping.
    pub total_reviews: usize,
    /// Reviews that received a theme assignment.
    pub classified_reviews: usize,
    /// Review count per theme.
    pub theme_counts: BTreeMap<String, usize>,
    /// Top themes by count.
    pub top_themes: Vec<ThemeCount>,
    /// True when existing theme data was reused without model calls.
    pub skipped: bool,
}

/// Classifies a week's reviews and persists the resulting theme data.
pub struct WeeklyThemeProcessor<'a> {
    ctx: &'a ServiceContext,
    config: &'a PipelineConfig,
    catalog: &'a ThemeCatalog,
}

impl<'a> WeeklyThemeProcessor<'a> {
    /// Creates a new processor.
    #[must_use]
    pub fn new(
        ctx: &'a ServiceContext,
        config: &'a PipelineConfig,
        catalog: &'a ThemeCatalog,
    ) -> Self {
        Self { ctx, config, catalog }
    }

    /// Classify one week of reviews.
    ///
    /// Idempotent: existing theme data for the week is reused unless
    /// `force` is set. Unreadable existing data is regenerated.
    ///
    /// # Errors
    ///
    /// Returns an error if the week has no reviews at all, or if
    /// loading or persisting fails.
    pub async fn process_week(&self, week_key: &str, force: bool) -> Result<WeekReport, String> {
        let store = ReviewStore::new(self.ctx, &self.config.data_dir);

        if !force && store.theme_data_exists(week_key) {
            match store.load_theme_data(week_key) {
                Ok(existing) => {
                    println!("Theme data for week {week_key} already exists, skipping");
                    return Ok(WeekReport {
                        week_key: week_key.to_string(),
                        total_reviews: existing.total_reviews,
                        classified_reviews: existing
                            .reviews
                            .iter()
                            .filter(|r| r.theme.is_some())
                            .count(),
                        theme_counts: existing.theme_counts,
                        top_themes: existing.top_themes,
                        skipped: true,
                    });
                }
                Err(e) => {
                    eprintln!(
                        "warning: existing theme data for {week_key} unreadable, \
                         reclassifying: {e}"
                    );
                }
            }
        }

        let mut reviews = store.load_week_reviews(week_key)?;
        if reviews.is_empty() {
            return Err(format!("No reviews available for week {week_key}"));
        }
        if self.config.max_reviews_per_week > 0 {
            reviews.truncate(self.config.max_reviews_per_week);
        }

        let classifier = Classifier::new(self.ctx, self.config, self.catalog);
        let assignments = classifier.classify(&reviews, &format!("week_{week_key}")).await;

        let theme_counts = aggregate_theme_counts(&assignments);
        let top_themes = top_themes_by_count(&assignments, 5);

        let report = WeekReport {
            week_key: week_key.to_string(),
            total_reviews: reviews.len(),
            classified_reviews: assignments.len(),
            theme_counts: theme_counts.clone(),
            top_themes: top_themes.clone(),
            skipped: false,
        };

        // Nothing long enough to classify: report it, but persist no
        // artifact for downstream stages to trip over.
        if assignments.is_empty() {
            println!("Week {week_key}: no classifiable reviews, nothing persisted");
            return Ok(report);
        }

        let by_id: BTreeMap<&str, &ThemeAssignment> =
            assignments.iter().map(|a| (a.review_id.as_str(), a)).collect();
        let tagged: Vec<TaggedReview> = reviews
            .iter()
            .map(|review: &Review| {
                TaggedReview::from_review(review, by_id.get(review.review_id.as_str()).copied())
            })
            .collect();

        let data = WeekThemeData {
            week_key: week_key.to_string(),
            week_start_date: week_key.to_string(),
            week_end_date: week_end_date(week_key)?,
            total_reviews: reviews.len(),
            theme_counts,
            top_themes,
            reviews: tagged,
        };
        store.save_theme_data(&data)?;

        println!(
            "Week {week_key}: classified {}/{} reviews into {} themes",
            report.classified_reviews,
            report.total_reviews,
            report.theme_counts.len()
        );
        Ok(report)
    }

    /// Classify every week that has a reviews file. A failing week is
    /// reported and does not stop the remaining weeks.
    pub async fn process_all_weeks(&self, force: bool) -> Vec<(String, Result<WeekReport, String>)> {
        let store = ReviewStore::new(self.ctx, &self.config.data_dir);
        let weeks = match store.available_weeks() {
            Ok(weeks) => weeks,
            Err(e) => {
                eprintln!("error: cannot list available weeks: {e}");
                return Vec::new();
            }
        };

        let mut results = Vec::with_capacity(weeks.len());
        for week_key in weeks {
            let result = self.process_week(&week_key, force).await;
            if let Err(e) = &result {
                eprintln!("error: week {week_key} failed: {e}");
            }
            results.push((week_key, result));
        }

        let failed = results.iter().filter(|(_, r)| r.is_err()).count();
        println!("Processed {} weeks ({failed} failed)", results.len());
        results
    }
}
