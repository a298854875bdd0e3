//! Data model for reviews, weekly theme data and pulse documents.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single app-store review as ingested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    /// Stable identifier from the store.
    pub review_id: String,
    /// Review title; may be empty.
    #[serde(default)]
    pub title: String,
    /// Review body text.
    #[serde(default)]
    pub text: String,
    /// When the review was posted.
    pub date: DateTime<Utc>,
}

/// Classification result tying a review to a catalog theme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeAssignment {
    /// Review this assignment covers.
    pub review_id: String,
    /// Catalog theme name, guaranteed valid after guardrails.
    pub chosen_theme: String,
    /// One-line justification from the model or the guardrail pass.
    pub short_reason: String,
}

/// A review enriched with its classification, as persisted per week.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaggedReview {
    /// Stable identifier from the store.
    pub review_id: String,
    /// Review title; may be empty.
    #[serde(default)]
    pub title: String,
    /// Review body text.
    #[serde(default)]
    pub text: String,
    /// When the review was posted.
    pub date: DateTime<Utc>,
    /// Assigned theme, `None` when the review was skipped as too short.
    #[serde(default)]
    pub theme: Option<String>,
    /// Why the theme was assigned.
    #[serde(default)]
    pub theme_reason: Option<String>,
}

/// Per-theme extraction from one summarization pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeSummary {
    /// Theme this summary covers.
    pub theme: String,
    /// Deduplicated key points, at most ten.
    pub key_points: Vec<String>,
    /// Deduplicated representative quotes, at most five.
    pub candidate_quotes: Vec<String>,
}

/// One theme with its review count, used for rankings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeCount {
    /// Theme name.
    pub theme: String,
    /// Number of reviews assigned to the theme.
    pub count: usize,
}

/// Everything the classification stage persists for one week.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeekThemeData {
    /// Week key, the Monday of the week as `YYYY-MM-DD`.
    pub week_key: String,
    /// Same as the week key.
    pub week_start_date: String,
    /// Sunday of the week as `YYYY-MM-DD`.
    pub week_end_date: String,
    /// Reviews considered for the week after filtering and capping.
    pub total_reviews: usize,
    /// Review count per theme, sorted by theme name.
    pub theme_counts: BTreeMap<String, usize>,
    /// Top themes by count, ties broken by name.
    pub top_themes: Vec<ThemeCount>,
    /// The week's reviews with their assignments.
    pub reviews: Vec<TaggedReview>,
}

/// One theme entry inside a pulse document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PulseTheme {
    /// Theme name.
    pub name: String,
    /// Short summary for stakeholders.
    pub summary: String,
}

/// The weekly pulse itself: a compact stakeholder-facing document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PulseDocument {
    /// Document title.
    pub title: String,
    /// Opening overview paragraph.
    pub overview: String,
    /// Exactly three theme entries.
    pub themes: Vec<PulseTheme>,
    /// Exactly three representative quotes.
    pub quotes: Vec<String>,
    /// Exactly three suggested actions.
    pub actions: Vec<String>,
}

/// A pulse document with its generation metadata, as persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PulseRecord {
    /// Week key, the Monday of the week as `YYYY-MM-DD`.
    pub week_key: String,
    /// Same as the week key.
    pub week_start_date: String,
    /// Sunday of the week as `YYYY-MM-DD`.
    pub week_end_date: String,
    /// When the pulse was generated.
    pub generated_at: DateTime<Utc>,
    /// Reviews that fed the pulse.
    pub total_reviews: usize,
    /// The three themes the pulse covers, with counts.
    pub top_3_themes: Vec<ThemeCount>,
    /// The document itself.
    pub pulse: PulseDocument,
    /// Word count of the document at save time.
    pub word_count: usize,
}

impl TaggedReview {
    /// Attach an assignment to a plain review.
    #[must_use]
    pub fn from_review(review: &Review, assignment: Option<&ThemeAssignment>) -> Self {
        Self {
            review_id: review.review_id.clone(),
            title: review.title.clone(),
            text: review.text.clone(),
            date: review.date,
            theme: assignment.map(|a| a.chosen_theme.clone()),
            theme_reason: assignment.map(|a| a.short_reason.clone()),
        }
    }
}
