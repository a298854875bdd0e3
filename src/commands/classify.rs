//! `pulse classify` command.

use crate::config::PipelineConfig;
use crate::context::ServiceContext;
use crate::pipeline::processor::WeeklyThemeProcessor;
use crate::themes::ThemeCatalog;

/// Execute the `classify` command for one week or all available weeks.
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
    let catalog = ThemeCatalog::default();
    let processor = WeeklyThemeProcessor::new(ctx, config, &catalog);

    match week {
        Some(week_key) => {
            let report = processor.process_week(week_key, force).await?;
            print_report(&report.week_key, report.classified_reviews, report.skipped);
            Ok(())
        }
        None => {
            let results = processor.process_all_weeks(force).await;
            if results.is_empty() {
                return Err("No review files found to classify".to_string());
            }
            let mut succeeded = 0;
            for (week_key, result) in &results {
                match result {
                    Ok(report) => {
                        succeeded += 1;
                        print_report(week_key, report.classified_reviews, report.skipped);
                    }
                    Err(e) => println!("{week_key}: failed ({e})"),
                }
            }
            if succeeded == 0 {
                return Err("All weeks failed to classify".to_string());
            }
            Ok(())
        }
    }
}

fn print_report(week_key: &str, classified: usize, skipped: bool) {
    if skipped {
        println!("{week_key}: already classified, skipped");
    } else {
        println!("{week_key}: classified {classified} reviews");
    }
}
