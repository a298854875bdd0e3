//! `pulse generate` command.

use crate::config::PipelineConfig;
use crate::context::ServiceContext;
use crate::pipeline::generator::WeeklyPulseGenerator;
use crate::store::ReviewStore;

/// Execute the `generate` command for one week or all classified weeks.
///
/// # Errors
///
/// Returns an error string when the requested week fails, or when every
/// week of an all-weeks run fails.
pub async fn run(
    ctx: &ServiceContext,
    config: &PipelineConfig,
    week: Option<&str>,
    force: bool,
) -> Result<(), String> {
    let store = ReviewStore::new(ctx, &config.data_dir);
    let generator = WeeklyPulseGenerator::new(ctx, config);

    let weeks = match week {
        Some(week_key) => vec![week_key.to_string()],
        None => {
            let weeks = store.theme_weeks()?;
            if weeks.is_empty() {
                return Err("No classified weeks found; run classify first".to_string());
            }
            weeks
        }
    };

    let mut failures = Vec::new();
    for week_key in &weeks {
        let theme_data = match store.load_theme_data(week_key) {
            Ok(data) => data,
            Err(e) => {
                println!("{week_key}: failed ({e})");
                failures.push(week_key.clone());
                continue;
            }
        };
        match generator.generate(week_key, &theme_data, force).await {
            Ok(record) => {
                println!("{week_key}: pulse ready ({} words)", record.word_count);
            }
            Err(e) => {
                println!("{week_key}: failed ({e})");
                failures.push(week_key.clone());
            }
        }
    }

    if failures.len() == weeks.len() {
        return Err(format!("All {} weeks failed to generate", weeks.len()));
    }
    Ok(())
}
