//! `pulse status` command.

use std::collections::BTreeSet;

use crate::config::PipelineConfig;
use crate::context::ServiceContext;
use crate::store::ReviewStore;

/// Execute the `status` command.
///
/// Displays a table of all known weeks showing review availability,
/// classification state, and pulse state.
///
/// # Errors
///
/// Returns an error string if the data directories cannot be listed.
pub fn run(ctx: &ServiceContext, config: &PipelineConfig) -> Result<(), String> {
    let store = ReviewStore::new(ctx, &config.data_dir);

    let mut weeks: BTreeSet<String> = store.available_weeks()?.into_iter().collect();
    weeks.extend(store.theme_weeks()?);

    if weeks.is_empty() {
        println!("No review data found under {}.", config.data_dir.display());
        return Ok(());
    }

    // Collect rows for column-width calculation.
    let mut rows: Vec<(String, String, String, String, String)> = Vec::new();
    for week_key in &weeks {
        let reviews = match store.load_week_reviews(week_key) {
            Ok(reviews) => reviews.len().to_string(),
            Err(_) => "-".to_string(),
        };
        let themes = if store.theme_data_exists(week_key) { "yes" } else { "no" };
        let (pulse, words) = if store.pulse_exists(week_key) {
            match store.load_pulse(week_key) {
                Ok(record) => ("yes".to_string(), record.word_count.to_string()),
                Err(_) => ("corrupt".to_string(), "-".to_string()),
            }
        } else {
            ("no".to_string(), "-".to_string())
        };
        rows.push((week_key.clone(), reviews, themes.to_string(), pulse, words));
    }

    // Calculate column widths.
    let week_width = rows.iter().map(|r| r.0.len()).max().unwrap_or(4).max(4);
    let reviews_width = rows.iter().map(|r| r.1.len()).max().unwrap_or(7).max(7);
    let themes_width = rows.iter().map(|r| r.2.len()).max().unwrap_or(6).max(6);
    let pulse_width = rows.iter().map(|r| r.3.len()).max().unwrap_or(5).max(5);
    let words_width = rows.iter().map(|r| r.4.len()).max().unwrap_or(5).max(5);

    // Print header.
    println!(
        "{:<week_width$}  {:<reviews_width$}  {:<themes_width$}  {:<pulse_width$}  {:<words_width$}",
        "WEEK", "REVIEWS", "THEMES", "PULSE", "WORDS",
    );
    println!(
        "{:-<week_width$}  {:-<reviews_width$}  {:-<themes_width$}  {:-<pulse_width$}  {:-<words_width$}",
        "", "", "", "", "",
    );

    // Print rows.
    for (week, reviews, themes, pulse, words) in &rows {
        println!(
            "{week:<week_width$}  {reviews:<reviews_width$}  {themes:<themes_width$}  \
             {pulse:<pulse_width$}  {words:<words_width$}",
        );
    }

    println!("\n{} week(s) total.", rows.len());
    Ok(())
}
