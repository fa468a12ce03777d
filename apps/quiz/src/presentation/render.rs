//! Page rendering. Every user- or API-supplied string passes through
//! [`escape_html`] before it reaches a template.

use crate::history::HistorySummary;
use crate::models::answers::{Question, QuestionKind, QUIZ_SCHEMA};
use crate::models::recommendation::{StoredRecommendation, PLACEHOLDER_TITLE};
use crate::models::user::AuthUser;
use crate::presentation::templates;
use crate::presentation::{
    ai_summary_or_default, format_timestamp, format_timestamp_str, truncate, DisplayRow,
    HISTORY_SUMMARY_CHARS,
};
use crate::quiz::service::RemoteHistory;

pub const SIGNED_OUT_REMOTE: &str = "Please log in to see previous recommendations.";
pub const SIGNED_OUT_LOCAL: &str = "Please log in to see your recent recommendations.";
pub const EMPTY_HISTORY: &str = "No previous recommendations yet.";
pub const REMOTE_FAILED: &str = "Failed to load previous recommendations.";

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Substitutes `{name}` placeholders in one pass. Unknown placeholders and
/// stray braces are left as they are.
pub fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let substituted = after.find('}').and_then(|close| {
            let name = &after[..close];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, close))
        });
        match substituted {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

fn layout(title: &str, user: Option<&AuthUser>, content: &str) -> String {
    fill(
        templates::LAYOUT,
        &[
            ("title", &escape_html(title)),
            ("auth_bar", &auth_bar(user)),
            ("content", content),
        ],
    )
}

fn auth_bar(user: Option<&AuthUser>) -> String {
    match user {
        Some(user) => fill(
            templates::AUTH_SIGNED_IN,
            &[("name", &escape_html(user.greeting_name()))],
        ),
        None => templates::AUTH_SIGNED_OUT.to_string(),
    }
}

fn alert(message: Option<&str>) -> String {
    message
        .map(|m| fill(templates::ALERT, &[("message", &escape_html(m))]))
        .unwrap_or_default()
}

fn paragraph(text: &str) -> String {
    format!("<p>{}</p>", escape_html(text))
}

// ────────────────────────────────────────────────────────────────────────────
// Quiz form
// ────────────────────────────────────────────────────────────────────────────

fn question_input(question: &Question) -> String {
    let key = question.key;
    let choices = |template: &str| {
        question
            .options
            .iter()
            .map(|option| fill(template, &[("key", key), ("value", &escape_html(option))]))
            .collect::<Vec<_>>()
            .join("\n")
    };

    match question.kind {
        QuestionKind::Multi { .. } => choices(templates::CHECKBOX),
        QuestionKind::Single if !question.options.is_empty() => choices(templates::RADIO),
        QuestionKind::Single => fill(
            templates::TEXT_INPUT,
            &[
                ("key", key),
                ("required", if question.required { " required" } else { "" }),
            ],
        ),
        QuestionKind::Scale { min, max } => fill(
            templates::SCALE_INPUT,
            &[
                ("key", key),
                ("min", &min.to_string()),
                ("max", &max.to_string()),
            ],
        ),
    }
}

fn question_hint(question: &Question) -> String {
    match question.kind {
        QuestionKind::Multi { limit } => format!(" (choose up to {limit})"),
        _ if question.required => " *".to_string(),
        _ => String::new(),
    }
}

pub fn quiz_page(user: Option<&AuthUser>, message: Option<&str>) -> String {
    let questions = QUIZ_SCHEMA
        .iter()
        .map(|question| {
            fill(
                templates::QUESTION,
                &[
                    ("prompt", &escape_html(question.prompt)),
                    ("hint", &question_hint(question)),
                    ("input", &question_input(question)),
                ],
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let content = fill(
        templates::QUIZ_FORM,
        &[("alert", &alert(message)), ("questions", &questions)],
    );
    layout("Quiz", user, &content)
}

// ────────────────────────────────────────────────────────────────────────────
// Result
// ────────────────────────────────────────────────────────────────────────────

pub fn result_page(user: Option<&AuthUser>, rows: &[DisplayRow], ai_summary: &str) -> String {
    let rows = rows
        .iter()
        .map(|row| {
            fill(
                templates::RESULT_ROW,
                &[
                    ("label", &escape_html(&row.label)),
                    ("job_title", &escape_html(&row.job_title)),
                    ("description", &escape_html(&row.description)),
                ],
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let content = fill(
        templates::RESULT,
        &[
            ("rows", &rows),
            ("ai_summary", &escape_html(ai_summary_or_default(ai_summary))),
        ],
    );
    layout("Your recommendation", user, &content)
}

// ────────────────────────────────────────────────────────────────────────────
// History
// ────────────────────────────────────────────────────────────────────────────

fn local_history(entries: Option<&[HistorySummary]>) -> String {
    let entries = match entries {
        None => return paragraph(SIGNED_OUT_LOCAL),
        Some([]) => return paragraph(EMPTY_HISTORY),
        Some(entries) => entries,
    };

    let items = entries
        .iter()
        .map(|entry| {
            fill(
                templates::LOCAL_HISTORY_ITEM,
                &[
                    ("text", &escape_html(&entry.text)),
                    ("ts", &escape_html(&format_timestamp(Some(entry.ts)))),
                ],
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    fill(templates::LOCAL_HISTORY_LIST, &[("items", &items)])
}

fn remote_card(stored: &StoredRecommendation) -> String {
    let best_match = stored
        .best_match
        .as_ref()
        .map(|job| job.job_title.as_str())
        .unwrap_or(PLACEHOLDER_TITLE);
    let alternatives = stored
        .alternatives
        .iter()
        .map(|job| job.job_title.as_str())
        .collect::<Vec<_>>();
    let alternatives = if alternatives.is_empty() {
        "None".to_string()
    } else {
        alternatives.join(", ")
    };
    let summary = truncate(
        ai_summary_or_default(stored.ai_summary.as_deref().unwrap_or("")),
        HISTORY_SUMMARY_CHARS,
    );

    fill(
        templates::REMOTE_CARD,
        &[
            ("best_match", &escape_html(best_match)),
            ("ts", &escape_html(&format_timestamp_str(stored.timestamp.as_deref()))),
            ("alternatives", &escape_html(&alternatives)),
            ("ai_summary", &escape_html(&summary)),
        ],
    )
}

fn remote_history(remote: &RemoteHistory) -> String {
    match remote {
        RemoteHistory::SignedOut => paragraph(SIGNED_OUT_REMOTE),
        RemoteHistory::Failed => alert(Some(REMOTE_FAILED)),
        RemoteHistory::Loaded(items) if items.is_empty() => paragraph(EMPTY_HISTORY),
        RemoteHistory::Loaded(items) => items.iter().map(remote_card).collect::<Vec<_>>().join("\n"),
    }
}

/// `local` is `None` when no history slot applies to the visitor.
pub fn history_page(
    user: Option<&AuthUser>,
    local: Option<&[HistorySummary]>,
    remote: &RemoteHistory,
) -> String {
    let content = fill(
        templates::HISTORY,
        &[
            ("local", &local_history(local)),
            ("remote", &remote_history(remote)),
        ],
    );
    layout("History", user, &content)
}

pub fn error_page(message: &str) -> String {
    let content = fill(templates::ERROR_PAGE, &[("alert", &alert(Some(message)))]);
    layout("Error", None, &content)
}
