use serde::{Deserialize, Serialize};

/// Title used for filler rows and for a response without a best match.
pub const PLACEHOLDER_TITLE: &str = "N/A";

/// A single ranked job returned by the recommendation API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobMatch {
    pub job_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Similarity score as reported by the API; passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl JobMatch {
    pub fn new(job_title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            job_title: job_title.into(),
            description: Some(description.into()),
            score: None,
        }
    }

    pub fn placeholder() -> Self {
        Self {
            job_title: PLACEHOLDER_TITLE.to_string(),
            description: None,
            score: None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.job_title == PLACEHOLDER_TITLE
    }
}

/// Canonical recommendation result.
///
/// Deserialization also accepts the older `{recommendations, explanation}`
/// response and converts it; serialization always emits the canonical shape.
/// A body carrying neither shape (e.g. `{"error": ...}`) is rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireResponse")]
pub struct RecommendationResult {
    pub best_match: JobMatch,
    pub alternatives: Vec<JobMatch>,
    pub ai_summary: String,
}

impl RecommendationResult {
    /// Titles of the real (non-placeholder) jobs, best match first.
    pub fn job_titles(&self) -> Vec<&str> {
        std::iter::once(&self.best_match)
            .chain(self.alternatives.iter())
            .filter(|job| !job.is_placeholder())
            .map(|job| job.job_title.as_str())
            .collect()
    }
}

/// Union of both response shapes served by the recommendation API over time.
/// The canonical fields win whenever either of them is present.
#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    best_match: Option<JobMatch>,
    #[serde(default)]
    alternatives: Option<Vec<JobMatch>>,
    #[serde(default)]
    ai_summary: Option<String>,
    #[serde(default)]
    recommendations: Option<Vec<JobMatch>>,
    #[serde(default)]
    explanation: Option<String>,
}

impl TryFrom<WireResponse> for RecommendationResult {
    type Error = String;

    fn try_from(wire: WireResponse) -> Result<Self, Self::Error> {
        if wire.best_match.is_some() || wire.alternatives.is_some() {
            return Ok(Self {
                best_match: wire.best_match.unwrap_or_else(JobMatch::placeholder),
                alternatives: wire.alternatives.unwrap_or_default(),
                ai_summary: wire.ai_summary.unwrap_or_default(),
            });
        }

        let Some(recommendations) = wire.recommendations else {
            return Err(
                "response carries neither best_match/alternatives nor recommendations".to_string(),
            );
        };
        let mut jobs = recommendations.into_iter();
        Ok(Self {
            best_match: jobs.next().unwrap_or_else(JobMatch::placeholder),
            alternatives: jobs.collect(),
            ai_summary: wire.explanation.unwrap_or_default(),
        })
    }
}

/// One item of `GET /api/recommendations/{user_id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecommendation {
    #[serde(default)]
    pub best_match: Option<JobMatch>,
    #[serde(default)]
    pub alternatives: Vec<JobMatch>,
    #[serde(default)]
    pub ai_summary: Option<String>,
    /// ISO-8601 as written by the API; may lack a UTC offset.
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryResponse {
    #[serde(default)]
    pub recommendations: Vec<StoredRecommendation>,
}
