//! Quiz answers and the fixed question schema they are validated against.
//!
//! Multi-select limits are enforced at the input layer: the (n+1)-th selection
//! for a key is rejected, so an `AnswerSet` never holds more than the limit.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

// ────────────────────────────────────────────────────────────────────────────
// Schema
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionKind {
    /// One free-text or radio value.
    Single,
    /// Checkbox group; at most `limit` selections.
    Multi { limit: usize },
    /// Integer rating, inclusive bounds.
    Scale { min: u8, max: u8 },
}

#[derive(Debug, Clone, Copy)]
pub struct Question {
    pub key: &'static str,
    pub prompt: &'static str,
    pub kind: QuestionKind,
    pub required: bool,
    /// Empty for free-text questions.
    pub options: &'static [&'static str],
}

pub const CAREER_GOAL: &str = "career_goal";

pub const QUIZ_SCHEMA: &[Question] = &[
    Question {
        key: "experience",
        prompt: "Which areas do you already have experience in?",
        kind: QuestionKind::Multi { limit: 3 },
        required: false,
        options: &[
            "software development",
            "data analysis",
            "design",
            "marketing",
            "sales",
            "customer support",
            "teaching",
            "healthcare",
        ],
    },
    Question {
        key: "tasks",
        prompt: "Which tasks do you enjoy most?",
        kind: QuestionKind::Multi { limit: 3 },
        required: false,
        options: &[
            "solving problems",
            "building things",
            "helping people",
            "organizing",
            "writing",
            "presenting",
            "researching",
        ],
    },
    Question {
        key: "confidence",
        prompt: "How confident are you in your current skills? (1-10)",
        kind: QuestionKind::Scale { min: 1, max: 10 },
        required: false,
        options: &[],
    },
    Question {
        key: "work_style",
        prompt: "Which best describes your work style?",
        kind: QuestionKind::Single,
        required: false,
        options: &["analytical", "creative", "practical"],
    },
    Question {
        key: "skills",
        prompt: "Pick up to four skills you are strongest at.",
        kind: QuestionKind::Multi { limit: 4 },
        required: false,
        options: &[
            "python",
            "sql",
            "communication",
            "leadership",
            "excel",
            "javascript",
            "statistics",
            "project management",
        ],
    },
    Question {
        key: "career_interests",
        prompt: "Which industries interest you?",
        kind: QuestionKind::Multi { limit: 3 },
        required: false,
        options: &[
            "technology",
            "finance",
            "healthcare",
            "education",
            "media",
            "public sector",
        ],
    },
    Question {
        key: "work_interest",
        prompt: "What kind of work would you find most rewarding?",
        kind: QuestionKind::Single,
        required: false,
        options: &[],
    },
    Question {
        key: "work_environment",
        prompt: "What is your preferred work environment?",
        kind: QuestionKind::Single,
        required: false,
        options: &["remote", "office", "hybrid", "outdoors"],
    },
    Question {
        key: "challenges",
        prompt: "What is your biggest challenge right now?",
        kind: QuestionKind::Single,
        required: false,
        options: &[],
    },
    Question {
        key: CAREER_GOAL,
        prompt: "Describe your career goal in a sentence.",
        kind: QuestionKind::Single,
        required: true,
        options: &[],
    },
];

pub fn find_question(key: &str) -> Option<&'static Question> {
    QUIZ_SCHEMA.iter().find(|q| q.key == key)
}

// ────────────────────────────────────────────────────────────────────────────
// Answers
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Please answer the question '{0}'.")]
    MissingField(String),

    #[error("You can select at most {limit} options for '{key}'.")]
    TooManySelections { key: String, limit: usize },

    #[error("Invalid value for '{key}': {value}")]
    InvalidValue { key: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Single(String),
    Multi(Vec<String>),
}

/// Question key → answer. Serialized as a plain JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AnswerSet(BTreeMap<String, AnswerValue>);

impl AnswerSet {
    /// Builds an answer set from `application/x-www-form-urlencoded` pairs.
    /// Unknown keys and blank values are dropped; the result is validated.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut answers = AnswerSet::default();
        for (key, value) in pairs {
            let key = key.as_ref();
            let value = value.as_ref().trim();
            let Some(question) = find_question(key) else {
                continue;
            };
            if value.is_empty() {
                continue;
            }
            match question.kind {
                QuestionKind::Multi { .. } => answers.select(key, value)?,
                QuestionKind::Single | QuestionKind::Scale { .. } => answers.set(key, value),
            }
        }
        answers.validate()?;
        Ok(answers)
    }

    /// Parses a urlencoded form body.
    pub fn from_form(body: &[u8]) -> Result<Self, ValidationError> {
        Self::from_pairs(url::form_urlencoded::parse(body))
    }

    /// Sets a single-valued answer, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0
            .insert(key.into(), AnswerValue::Single(value.into()));
    }

    /// Builder form of [`AnswerSet::set`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Adds one selection to a multi-select answer. Rejects the selection that
    /// would exceed the question's limit; repeated selections are ignored.
    pub fn select(&mut self, key: &str, value: impl Into<String>) -> Result<(), ValidationError> {
        let value = value.into();
        let limit = match find_question(key).map(|q| q.kind) {
            Some(QuestionKind::Multi { limit }) => Some(limit),
            _ => None,
        };

        let mut selected = match self.0.remove(key) {
            Some(AnswerValue::Multi(selected)) => selected,
            Some(AnswerValue::Single(existing)) => vec![existing],
            None => Vec::new(),
        };

        let outcome = match limit {
            _ if selected.contains(&value) => Ok(()),
            Some(limit) if selected.len() >= limit => Err(ValidationError::TooManySelections {
                key: key.to_string(),
                limit,
            }),
            _ => {
                selected.push(value);
                Ok(())
            }
        };

        self.0.insert(key.to_string(), AnswerValue::Multi(selected));
        outcome
    }

    #[cfg(test)]
    pub fn get(&self, key: &str) -> Option<&AnswerValue> {
        self.0.get(key)
    }

    /// Returns the value of a single-valued answer.
    pub fn single(&self, key: &str) -> Option<&str> {
        match self.0.get(key) {
            Some(AnswerValue::Single(value)) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Free-text goal forwarded as `user_input`; empty when unanswered.
    pub fn career_goal(&self) -> &str {
        self.single(CAREER_GOAL).unwrap_or("")
    }

    /// Checks required questions, rating bounds and selection limits.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for question in QUIZ_SCHEMA {
            let answer = self.0.get(question.key);

            if question.required {
                let answered = match answer {
                    Some(AnswerValue::Single(v)) => !v.trim().is_empty(),
                    Some(AnswerValue::Multi(v)) => !v.is_empty(),
                    None => false,
                };
                if !answered {
                    return Err(ValidationError::MissingField(question.key.to_string()));
                }
            }

            match (question.kind, answer) {
                (QuestionKind::Scale { min, max }, Some(AnswerValue::Single(raw))) => {
                    let in_range = raw
                        .trim()
                        .parse::<u8>()
                        .map(|n| (min..=max).contains(&n))
                        .unwrap_or(false);
                    if !in_range {
                        return Err(ValidationError::InvalidValue {
                            key: question.key.to_string(),
                            value: raw.clone(),
                        });
                    }
                }
                (QuestionKind::Multi { limit }, Some(AnswerValue::Multi(selected)))
                    if selected.len() > limit =>
                {
                    return Err(ValidationError::TooManySelections {
                        key: question.key.to_string(),
                        limit,
                    });
                }
                _ => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_pairs_collects_multi_select_in_order() {
        let answers = AnswerSet::from_pairs([
            ("skills", "python"),
            ("skills", "sql"),
            ("career_goal", "become a data analyst"),
        ])
        .unwrap();

        assert_eq!(
            answers.get("skills"),
            Some(&AnswerValue::Multi(vec![
                "python".to_string(),
                "sql".to_string()
            ]))
        );
        assert_eq!(answers.career_goal(), "become a data analyst");
    }

    #[test]
    fn test_selection_past_limit_is_rejected() {
        let result = AnswerSet::from_pairs([
            ("career_goal", "x"),
            ("experience", "design"),
            ("experience", "sales"),
            ("experience", "teaching"),
            ("experience", "marketing"),
        ]);
        assert_eq!(
            result,
            Err(ValidationError::TooManySelections {
                key: "experience".to_string(),
                limit: 3
            })
        );
    }

    #[test]
    fn test_skills_allow_four_selections() {
        let mut answers = AnswerSet::default().with(CAREER_GOAL, "x");
        for skill in ["python", "sql", "excel", "leadership"] {
            answers.select("skills", skill).unwrap();
        }
        assert!(answers.select("skills", "statistics").is_err());
        assert!(answers.validate().is_ok());
    }

    #[test]
    fn test_duplicate_selection_does_not_count_twice() {
        let mut answers = AnswerSet::default();
        answers.select("tasks", "writing").unwrap();
        answers.select("tasks", "writing").unwrap();
        assert_eq!(
            answers.get("tasks"),
            Some(&AnswerValue::Multi(vec!["writing".to_string()]))
        );
    }

    #[test]
    fn test_missing_career_goal_fails_validation() {
        let result = AnswerSet::from_pairs([("work_style", "creative")]);
        assert_eq!(
            result,
            Err(ValidationError::MissingField("career_goal".to_string()))
        );

        let blank = AnswerSet::from_pairs([("career_goal", "   ")]);
        assert!(matches!(blank, Err(ValidationError::MissingField(_))));
    }

    #[test]
    fn test_confidence_must_be_in_range() {
        let result = AnswerSet::from_pairs([("career_goal", "x"), ("confidence", "11")]);
        assert!(matches!(
            result,
            Err(ValidationError::InvalidValue { ref key, .. }) if key == "confidence"
        ));

        let ok = AnswerSet::from_pairs([("career_goal", "x"), ("confidence", "7")]).unwrap();
        assert_eq!(ok.single("confidence"), Some("7"));
    }

    #[test]
    fn test_unknown_keys_and_blanks_are_dropped() {
        let answers = AnswerSet::from_pairs([
            ("career_goal", "x"),
            ("csrf", "token"),
            ("challenges", ""),
        ])
        .unwrap();
        assert!(answers.get("csrf").is_none());
        assert!(answers.get("challenges").is_none());
    }

    #[test]
    fn test_from_form_decodes_urlencoded_body() {
        let answers =
            AnswerSet::from_form(b"career_goal=work+with+data&skills=sql&skills=python").unwrap();
        assert_eq!(answers.career_goal(), "work with data");
        assert!(matches!(answers.get("skills"), Some(AnswerValue::Multi(v)) if v.len() == 2));
    }

    #[test]
    fn test_answers_serialize_as_plain_object() {
        let mut answers = AnswerSet::default().with(CAREER_GOAL, "data");
        answers.select("skills", "sql").unwrap();
        let json = serde_json::to_value(&answers).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "career_goal": "data", "skills": ["sql"] })
        );
    }

    #[test]
    fn test_career_goal_defaults_to_empty() {
        assert_eq!(AnswerSet::default().career_goal(), "");
    }
}
