//! Display helpers: turn API results into display-ready values.
//! Pure functions only; HTML lives in `render`.

pub mod render;
pub mod templates;

use chrono::{DateTime, Local, NaiveDateTime, Utc};
use serde::Serialize;

use crate::models::recommendation::JobMatch;

pub const NO_DESCRIPTION: &str = "No description available.";
pub const NO_AI_SUMMARY: &str = "AI explanation unavailable";
pub const ELLIPSIS: char = '…';
/// The result view always shows this many rows.
pub const DISPLAY_SLOTS: usize = 5;
/// AI summaries in history cards are cut to this many characters.
pub const HISTORY_SUMMARY_CHARS: usize = 300;

/// One row of the result view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayRow {
    pub label: String,
    pub job_title: String,
    pub description: String,
}

/// Placeholder for absent text; a trailing `...` becomes a single period.
pub fn clean_description(text: Option<&str>) -> String {
    match text {
        None => NO_DESCRIPTION.to_string(),
        Some(t) if t.trim().is_empty() => NO_DESCRIPTION.to_string(),
        Some(t) => match t.strip_suffix("...") {
            Some(stem) => format!("{stem}."),
            None => t.to_string(),
        },
    }
}

/// Keeps at most `max_len` characters, appending `…` when anything was cut.
pub fn truncate(text: &str, max_len: usize) -> String {
    match text.char_indices().nth(max_len) {
        None => text.to_string(),
        Some((cut, _)) => format!("{}{ELLIPSIS}", &text[..cut]),
    }
}

/// Medium date, short time, in the local zone. Empty for an absent instant.
pub fn format_timestamp(ts: Option<DateTime<Utc>>) -> String {
    match ts {
        Some(ts) => ts
            .with_timezone(&Local)
            .format("%b %-d, %Y, %-I:%M %p")
            .to_string(),
        None => String::new(),
    }
}

/// Like [`format_timestamp`] for API-supplied strings. Accepts RFC 3339 and
/// offset-less ISO-8601 (read as UTC); anything unparseable yields "".
pub fn format_timestamp_str(raw: Option<&str>) -> String {
    format_timestamp(raw.and_then(parse_api_timestamp))
}

fn parse_api_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// `[best] ++ alternatives`, padded with placeholders or cut to `max_slots`.
pub fn build_display_list(
    best: &JobMatch,
    alternatives: &[JobMatch],
    max_slots: usize,
) -> Vec<JobMatch> {
    let mut jobs: Vec<JobMatch> = std::iter::once(best)
        .chain(alternatives.iter())
        .take(max_slots)
        .cloned()
        .collect();
    jobs.resize_with(max_slots, JobMatch::placeholder);
    jobs
}

/// Labels the display list and cleans each description.
pub fn display_rows(jobs: &[JobMatch]) -> Vec<DisplayRow> {
    jobs.iter()
        .enumerate()
        .map(|(idx, job)| DisplayRow {
            label: if idx == 0 {
                "Best Match".to_string()
            } else {
                format!("Suggestion {idx}")
            },
            job_title: job.job_title.clone(),
            description: clean_description(job.description.as_deref()),
        })
        .collect()
}

pub fn ai_summary_or_default(summary: &str) -> &str {
    if summary.trim().is_empty() {
        NO_AI_SUMMARY
    } else {
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_clean_description_placeholder_for_absent() {
        assert_eq!(clean_description(None), NO_DESCRIPTION);
        assert_eq!(clean_description(Some("")), NO_DESCRIPTION);
    }

    #[test]
    fn test_clean_description_replaces_trailing_ellipsis() {
        assert_eq!(clean_description(Some("Builds apps...")), "Builds apps.");
        assert_eq!(clean_description(Some("Builds apps.")), "Builds apps.");
        assert_eq!(clean_description(Some("Wait... what")), "Wait... what");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("abcdefgh", 5), "abcde…");
        assert_eq!(truncate("abc", 5), "abc");
        assert_eq!(truncate("abcde", 5), "abcde");
    }

    #[test]
    fn test_truncate_counts_characters_not_bytes() {
        assert_eq!(truncate("héllo wörld", 7), "héllo w…");
    }

    #[test]
    fn test_format_timestamp_absent_is_empty() {
        assert_eq!(format_timestamp(None), "");
        assert_eq!(format_timestamp_str(None), "");
        assert_eq!(format_timestamp_str(Some("yesterday")), "");
    }

    #[test]
    fn test_format_timestamp_renders_date_and_time() {
        let ts = Utc.with_ymd_and_hms(2024, 7, 15, 12, 0, 0).unwrap();
        let formatted = format_timestamp(Some(ts));
        assert!(formatted.contains("2024"), "got {formatted}");
        assert!(formatted.ends_with("AM") || formatted.ends_with("PM"));
    }

    #[test]
    fn test_format_timestamp_str_accepts_offsetless_iso() {
        assert!(!format_timestamp_str(Some("2024-07-15T12:00:00.123456")).is_empty());
        assert!(!format_timestamp_str(Some("2024-07-15T12:00:00Z")).is_empty());
    }

    #[test]
    fn test_display_list_pads_short_results() {
        let best = JobMatch::new("Data Analyst", "Analyzes data...");
        let alternatives = vec![JobMatch::new("BI Developer", ""), JobMatch::new("Statistician", "")];

        let list = build_display_list(&best, &alternatives, DISPLAY_SLOTS);

        assert_eq!(list.len(), 5);
        assert_eq!(list[0], best);
        assert!(list[3].is_placeholder());
        assert!(list[4].is_placeholder());
    }

    #[test]
    fn test_display_list_truncates_long_results() {
        let best = JobMatch::new("A", "");
        let alternatives: Vec<JobMatch> =
            (0..8).map(|i| JobMatch::new(format!("Alt {i}"), "")).collect();

        let list = build_display_list(&best, &alternatives, DISPLAY_SLOTS);
        assert_eq!(list.len(), 5);
        assert_eq!(list[4].job_title, "Alt 3");
    }

    #[test]
    fn test_display_rows_label_and_clean() {
        let list = build_display_list(&JobMatch::new("Data Analyst", "Analyzes data..."), &[], 5);
        let rows = display_rows(&list);

        assert_eq!(rows[0].label, "Best Match");
        assert_eq!(rows[0].description, "Analyzes data.");
        assert_eq!(rows[1].label, "Suggestion 1");
        assert_eq!(rows[4].job_title, "N/A");
        assert_eq!(rows[4].description, NO_DESCRIPTION);
    }

    #[test]
    fn test_ai_summary_default() {
        assert_eq!(ai_summary_or_default(""), NO_AI_SUMMARY);
        assert_eq!(ai_summary_or_default("Good fit"), "Good fit");
    }
}
