//! Prompt builders for the classification, summarization, synthesis and
//! compression calls.

use std::fmt::Write as _;

use crate::model::{PulseDocument, Review, ThemeSummary};
use crate::themes::ThemeCatalog;

/// Prompt asking the model to classify a batch of reviews into catalog
/// themes, returning a JSON array of assignments.
#[must_use]
pub fn classification_prompt(catalog: &ThemeCatalog, reviews: &[&Review]) -> String {
    let mut theme_block = String::new();
    for theme in catalog.themes() {
        let _ = writeln!(theme_block, "- {}: {}", theme.name, theme.description);
    }

    let mut reviews_block = String::new();
    for review in reviews {
        let _ = writeln!(reviews_block, "\nReview ID: {}", review.review_id);
        if !review.title.is_empty() {
            let _ = writeln!(reviews_block, "Title: {}", review.title);
        }
        let _ = writeln!(reviews_block, "Text: {}", review.text);
    }

    format!(
        "You are tagging stock broking app reviews into at most {theme_count} fixed themes.\n\
         \n\
         Allowed themes:\n\
         \n\
         {theme_block}\n\
         For each review, output:\n\
         - review_id\n\
         - chosen_theme (must be exactly one from the above list)\n\
         - short_reason (1 sentence, no PII)\n\
         \n\
         Reviews:\n\
         {reviews_block}\n\
         Output format: Return a JSON array where each object has:\n\
         {{\n\
           \"review_id\": \"<review_id>\",\n\
           \"chosen_theme\": \"<exact theme name from allowed list>\",\n\
           \"short_reason\": \"<one sentence reason, no PII>\"\n\
         }}\n\
         \n\
         Return ONLY valid JSON, no markdown or additional text.",
        theme_count = catalog.themes().len(),
    )
}

/// Prompt asking the model to extract key points and quotes from one
/// chunk of reviews belonging to a theme.
#[must_use]
pub fn chunk_summary_prompt(theme: &str, review_texts: &[&str]) -> String {
    let mut reviews_block = String::new();
    for (idx, text) in review_texts.iter().enumerate() {
        let _ = writeln!(reviews_block, "{}. {text}", idx + 1);
    }

    format!(
        "You are summarizing user feedback for a stock broking app.\n\
         \n\
         Theme: {theme}\n\
         \n\
         Reviews (cleaned, no PII):\n\
         \n\
         {reviews_block}\n\
         Tasks:\n\
         \n\
         1. Extract 3-5 factual, neutral key points about this theme\n\
         2. Identify up to 3 short, vivid quotes capturing sentiment\n\
         3. Do NOT include names, usernames, emails, IDs, demat numbers, or masked numbers\n\
         4. If a quote contains PII, rewrite it to keep meaning but fully remove personal details\n\
         \n\
         Return JSON:\n\
         \n\
         {{\n\
           \"theme\": \"{theme}\",\n\
           \"key_points\": [\"...\", \"...\"],\n\
           \"candidate_quotes\": [\"...\", \"...\", \"...\"]\n\
         }}\n\
         \n\
         Keep everything concise and non-promotional. Quotes should be 1-2 lines maximum.\n\
         \n\
         Return ONLY valid JSON, no markdown or additional text.",
    )
}

/// Prompt asking the model to synthesize theme summaries into the final
/// five-field pulse document.
#[must_use]
pub fn synthesis_prompt(week_start: &str, week_end: &str, summaries: &[ThemeSummary]) -> String {
    let summaries_json =
        serde_json::to_string_pretty(summaries).unwrap_or_else(|_| "[]".to_string());

    format!(
        "You are creating a weekly product pulse for internal stakeholders\n\
         (Product, Growth, Support, Leadership)\n\
         \n\
         Input:\n\
         \n\
         Time window: {week_start} to {week_end}\n\
         \n\
         Candidate themes with key points & quotes:\n\
         \n\
         {summaries_json}\n\
         \n\
         Constraints:\n\
         \n\
         1. Select Top 3 themes by frequency + impact\n\
         2. Produce:\n\
            - A short, crisp title for this week's pulse\n\
            - A one-paragraph overview (max 60 words)\n\
            - A bullet list of the Top 3 themes, each with a 1-sentence sentiment + key insight\n\
            - 3 anonymized user quotes, 1-2 lines, each tagged with theme\n\
            - 3 specific action ideas, each tied to a theme\n\
         \n\
         Style & Limits:\n\
         \n\
         - Total length <= 250 words\n\
         - Use crisp bullets; executive-friendly\n\
         - Neutral, fact-based tone\n\
         - No PII: remove all names, emails, phone numbers, account IDs, demat numbers, UPI IDs\n\
         \n\
         Output JSON:\n\
         \n\
         {{\n\
           \"title\": \"...\",\n\
           \"overview\": \"...\",\n\
           \"themes\": [\n\
             {{\"name\": \"...\", \"summary\": \"...\"}},\n\
             {{\"name\": \"...\", \"summary\": \"...\"}},\n\
             {{\"name\": \"...\", \"summary\": \"...\"}}\n\
           ],\n\
           \"quotes\": [\"...\", \"...\", \"...\"],\n\
           \"actions\": [\"...\", \"...\", \"...\"]\n\
         }}\n\
         \n\
         Return ONLY valid JSON, no markdown or additional text.",
    )
}

/// Prompt asking the model to compress an over-budget pulse document.
#[must_use]
pub fn compression_prompt(pulse: &PulseDocument, max_words: usize) -> String {
    let mut pulse_text = String::new();
    let _ = writeln!(pulse_text, "Title: {}", pulse.title);
    let _ = writeln!(pulse_text, "Overview: {}", pulse.overview);
    let _ = writeln!(pulse_text, "Themes:");
    for theme in &pulse.themes {
        let _ = writeln!(pulse_text, "  - {}: {}", theme.name, theme.summary);
    }
    let _ = writeln!(pulse_text, "Quotes:");
    for quote in &pulse.quotes {
        let _ = writeln!(pulse_text, "  - {quote}");
    }
    let _ = writeln!(pulse_text, "Actions:");
    for action in &pulse.actions {
        let _ = writeln!(pulse_text, "  - {action}");
    }

    format!(
        "Compress this note to <={max_words} words while preserving:\n\
         \n\
         - 3 themes\n\
         - 3 quotes\n\
         - 3 action ideas\n\
         - Bullet-based format\n\
         - No PII\n\
         \n\
         Current note:\n\
         \n\
         {pulse_text}\n\
         Return the same JSON structure with compressed content. Keep all fields but make \
         them more concise.\n\
         \n\
         Return ONLY valid JSON, no markdown or additional text.",
    )
}
