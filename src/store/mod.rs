//! Review store — persistence layer for weekly review, theme and pulse files.
//!
//! All files live under a data root and use the `FileSystem` port for
//! I/O. Directory layout:
//!
//! ```text
//! <root>/
//!   ├── reviews/   reviews_<week>.json
//!   ├── themes/    themes_<week>.json
//!   └── pulses/    pulse_<week>.json
//! ```
//!
//! `<week>` is always the Monday of the week as `YYYY-MM-DD`.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::Deserialize;

use crate::context::ServiceContext;
use crate::model::{PulseRecord, Review, WeekThemeData};

/// Wrapper shape of a weekly reviews file. Extra top-level fields from
/// the ingestion side are tolerated and ignored.
#[derive(Deserialize)]
struct ReviewsFile {
    reviews: Vec<Review>,
}

/// Persistence layer for weekly pipeline artifacts.
///
/// All I/O goes through `ctx.fs` so that the store works with live,
/// replaying, and in-memory adapters.
pub struct ReviewStore<'a> {
    ctx: &'a ServiceContext,
    root: PathBuf,
}

impl<'a> ReviewStore<'a> {
    /// Creates a new store rooted at the given data directory.
    #[must_use]
    pub fn new(ctx: &'a ServiceContext, root: &Path) -> Self {
        Self { ctx, root: root.to_path_buf() }
    }

    /// Loads the raw reviews for a week from `reviews/reviews_<week>.json`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_week_reviews(&self, week_key: &str) -> Result<Vec<Review>, String> {
        let path = self.reviews_path(week_key);
        let contents = self
            .ctx
            .fs
            .read_to_string(&path)
            .map_err(|e| format!("Failed to read reviews for week {week_key}: {e}"))?;
        let file: ReviewsFile = serde_json::from_str(&contents)
            .map_err(|e| format!("Failed to parse reviews for week {week_key}: {e}"))?;
        Ok(file.reviews)
    }

    /// Lists week keys that have a reviews file, sorted ascending.
    ///
    /// Returns an empty list when the reviews directory does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the reviews directory cannot be listed.
    pub fn available_weeks(&self) -> Result<Vec<String>, String> {
        self.list_weeks("reviews", "reviews_")
    }

    /// Lists week keys that have classified theme data, sorted ascending.
    ///
    /// # Errors
    ///
    /// Returns an error if the themes directory cannot be listed.
    pub fn theme_weeks(&self) -> Result<Vec<String>, String> {
        self.list_weeks("themes", "themes_")
    }

    /// Whether classified theme data exists for a week.
    #[must_use]
    pub fn theme_data_exists(&self, week_key: &str) -> bool {
        self.ctx.fs.exists(&self.themes_path(week_key))
    }

    /// Loads classified theme data for a week.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_theme_data(&self, week_key: &str) -> Result<WeekThemeData, String> {
        let path = self.themes_path(week_key);
        let contents = self
            .ctx
            .fs
            .read_to_string(&path)
            .map_err(|e| format!("Failed to read theme data for week {week_key}: {e}"))?;
        serde_json::from_str(&contents)
            .map_err(|e| format!("Failed to parse theme data for week {week_key}: {e}"))
    }

    /// Saves classified theme data for a week as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    pub fn save_theme_data(&self, data: &WeekThemeData) -> Result<(), String> {
        let json = serde_json::to_string_pretty(data)
            .map_err(|e| format!("Failed to serialize theme data for week {}: {e}", data.week_key))?;
        let path = self.themes_path(&data.week_key);
        self.ctx
            .fs
            .write(&path, &json)
            .map_err(|e| format!("Failed to write theme data for week {}: {e}", data.week_key))
    }

    /// Whether a generated pulse exists for a week.
    #[must_use]
    pub fn pulse_exists(&self, week_key: &str) -> bool {
        self.ctx.fs.exists(&self.pulse_path(week_key))
    }

    /// Loads the generated pulse for a week.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_pulse(&self, week_key: &str) -> Result<PulseRecord, String> {
        let path = self.pulse_path(week_key);
        let contents = self
            .ctx
            .fs
            .read_to_string(&path)
            .map_err(|e| format!("Failed to read pulse for week {week_key}: {e}"))?;
        serde_json::from_str(&contents)
            .map_err(|e| format!("Failed to parse pulse for week {week_key}: {e}"))
    }

    /// Saves a generated pulse for a week as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    pub fn save_pulse(&self, record: &PulseRecord) -> Result<(), String> {
        let json = serde_json::to_string_pretty(record)
            .map_err(|e| format!("Failed to serialize pulse for week {}: {e}", record.week_key))?;
        let path = self.pulse_path(&record.week_key);
        self.ctx
            .fs
            .write(&path, &json)
            .map_err(|e| format!("Failed to write pulse for week {}: {e}", record.week_key))
    }

    fn list_weeks(&self, dir: &str, prefix: &str) -> Result<Vec<String>, String> {
        let dir_path = self.root.join(dir);
        if !self.ctx.fs.exists(&dir_path) {
            return Ok(Vec::new());
        }
        let entries = self
            .ctx
            .fs
            .list_dir(&dir_path)
            .map_err(|e| format!("Failed to list {dir} directory: {e}"))?;
        let mut weeks: Vec<String> = entries
            .into_iter()
            .filter_map(|name| {
                name.strip_prefix(prefix)
                    .and_then(|rest| rest.strip_suffix(".json"))
                    .map(String::from)
            })
            .collect();
        weeks.sort();
        Ok(weeks)
    }

    fn reviews_path(&self, week_key: &str) -> PathBuf {
        self.root.join("reviews").join(format!("reviews_{week_key}.json"))
    }

    fn themes_path(&self, week_key: &str) -> PathBuf {
        self.root.join("themes").join(format!("themes_{week_key}.json"))
    }

    fn pulse_path(&self, week_key: &str) -> PathBuf {
        self.root.join("pulses").join(format!("pulse_{week_key}.json"))
    }
}

/// Week key for a timestamp: the Monday of its week as `YYYY-MM-DD`.
#[must_use]
pub fn week_key_for(date: DateTime<Utc>) -> String {
    let days_back = i64::from(date.date_naive().weekday().num_days_from_monday());
    let monday = date.date_naive() - Duration::days(days_back);
    monday.format("%Y-%m-%d").to_string()
}

/// End of the week for a week key: the Sunday six days later.
///
/// # Errors
///
/// Returns an error if the week key is not a valid `YYYY-MM-DD` date.
pub fn week_end_date(week_key: &str) -> Result<String, String> {
    let monday = NaiveDate::parse_from_str(week_key, "%Y-%m-%d")
        .map_err(|e| format!("Invalid week key {week_key}: {e}"))?;
    Ok((monday + Duration::days(6)).format("%Y-%m-%d").to_string())
}


#[cfg(test)]
mod tests {
    use super::test_fs::mem_fs_context;
    use super::*;
    use crate::model::{PulseDocument, ThemeCount};
    use std::collections::BTreeMap;

    fn sample_theme_data(week_key: &str) -> WeekThemeData {
        WeekThemeData {
            week_key: week_key.to_string(),
            week_start_date: week_key.to_string(),
            week_end_date: week_end_date(week_key).unwrap(),
            total_reviews: 2,
            theme_counts: BTreeMap::from([("Trading Experience".to_string(), 2)]),
            top_themes: vec![ThemeCount { theme: "Trading Experience".into(), count: 2 }],
            reviews: vec![],
        }
    }

    #[test]
    fn load_week_reviews_tolerates_extra_fields() {
        let ctx = mem_fs_context();
        let store = ReviewStore::new(&ctx, Path::new("/data"));

        ctx.fs
            .write(
                Path::new("/data/reviews/reviews_2025-06-02.json"),
                r#"{
                  "source": "app-store",
                  "fetched_at": "2025-06-09T00:00:00Z",
                  "reviews": [
                    {"review_id": "r1", "title": "Slow", "text": "App crashes on login.",
                     "date": "2025-06-03T10:00:00Z"}
                  ]
                }"#,
            )
            .unwrap();

        let reviews = store.load_week_reviews("2025-06-02").unwrap();
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].review_id, "r1");
    }

    #[test]
    fn available_weeks_sorted_and_empty_when_missing() {
        let ctx = mem_fs_context();
        let store = ReviewStore::new(&ctx, Path::new("/data"));

        assert!(store.available_weeks().unwrap().is_empty());

        for week in ["2025-06-09", "2025-06-02", "2025-06-16"] {
            ctx.fs
                .write(
                    &Path::new("/data/reviews").join(format!("reviews_{week}.json")),
                    r#"{"reviews": []}"#,
                )
                .unwrap();
        }

        let weeks = store.available_weeks().unwrap();
        assert_eq!(weeks, vec!["2025-06-02", "2025-06-09", "2025-06-16"]);
    }

    #[test]
    fn theme_data_round_trips_and_exists() {
        let ctx = mem_fs_context();
        let store = ReviewStore::new(&ctx, Path::new("/data"));

        assert!(!store.theme_data_exists("2025-06-02"));
        store.save_theme_data(&sample_theme_data("2025-06-02")).unwrap();
        assert!(store.theme_data_exists("2025-06-02"));

        let loaded = store.load_theme_data("2025-06-02").unwrap();
        assert_eq!(loaded.week_key, "2025-06-02");
        assert_eq!(loaded.week_end_date, "2025-06-08");
        assert_eq!(store.theme_weeks().unwrap(), vec!["2025-06-02"]);
    }

    #[test]
    fn pulse_round_trips_and_exists() {
        let ctx = mem_fs_context();
        let store = ReviewStore::new(&ctx, Path::new("/data"));

        let record = PulseRecord {
            week_key: "2025-06-02".into(),
            week_start_date: "2025-06-02".into(),
            week_end_date: "2025-06-08".into(),
            generated_at: "2025-06-09T08:00:00Z".parse().unwrap(),
            total_reviews: 2,
            top_3_themes: vec![ThemeCount { theme: "Trading Experience".into(), count: 2 }],
            pulse: PulseDocument {
                title: "Weekly Product Pulse".into(),
                overview: "Mostly trading feedback.".into(),
                themes: vec![],
                quotes: vec![],
                actions: vec![],
            },
            word_count: 5,
        };

        assert!(!store.pulse_exists("2025-06-02"));
        store.save_pulse(&record).unwrap();
        assert!(store.pulse_exists("2025-06-02"));

        let loaded = store.load_pulse("2025-06-02").unwrap();
        assert_eq!(loaded.word_count, 5);
        assert_eq!(loaded.pulse.title, "Weekly Product Pulse");
    }

    #[test]
    fn week_key_for_snaps_to_monday() {
        // A Wednesday.
        let wednesday: DateTime<Utc> = "2025-06-04T15:30:00Z".parse().unwrap();
        assert_eq!(week_key_for(wednesday), "2025-06-02");

        // A Monday stays put.
        let monday: DateTime<Utc> = "2025-06-02T00:00:00Z".parse().unwrap();
        assert_eq!(week_key_for(monday), "2025-06-02");

        // A Sunday belongs to the week that started six days earlier.
        let sunday: DateTime<Utc> = "2025-06-08T23:59:59Z".parse().unwrap();
        assert_eq!(week_key_for(sunday), "2025-06-02");
    }

    #[test]
    fn week_end_date_is_sunday() {
        assert_eq!(week_end_date("2025-06-02").unwrap(), "2025-06-08");
        assert!(week_end_date("not-a-date").is_err());
    }
}
