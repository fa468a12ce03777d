//! Quiz submission pipeline:
//! gateway call → display rows → local history entry → background persistence.
//!
//! The result is returned before the document-store write finishes. That
//! write happens at most once per accepted submission and never fails the
//! submission.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::documents::{quiz_responses_collection, DocumentStore};
use crate::gateway::{RequestError, RequestGateway};
use crate::history::slot::{KeyValueSlot, SlotError};
use crate::history::{HistoryScope, HistoryStore, HistorySummary};
use crate::models::answers::{AnswerSet, ValidationError};
use crate::models::recommendation::{RecommendationResult, StoredRecommendation};
use crate::models::user::AuthUser;
use crate::presentation::{
    ai_summary_or_default, build_display_list, display_rows, DisplayRow, DISPLAY_SLOTS,
};
use crate::quiz::guard::SubmissionGuard;

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("login required")]
    Unauthorized,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("a submission is already in flight")]
    InFlight,

    #[error(transparent)]
    Request(#[from] RequestError),
}

/// Everything the result view needs.
#[derive(Debug)]
pub struct QuizOutcome {
    pub submission_id: Uuid,
    pub sequence: u64,
    pub result: RecommendationResult,
    /// Always `DISPLAY_SLOTS` rows.
    pub rows: Vec<DisplayRow>,
    pub ai_summary: String,
    /// `None` when no history scope applies, the result named no jobs, or the
    /// slot write failed.
    pub history_entry: Option<HistorySummary>,
    /// Background document-store write; `None` for anonymous submissions.
    pub persistence: Option<JoinHandle<()>>,
}

/// Previously stored recommendations for the history page.
#[derive(Debug)]
pub enum RemoteHistory {
    SignedOut,
    Loaded(Vec<StoredRecommendation>),
    Failed,
}

pub struct QuizService {
    gateway: RequestGateway,
    slot: Arc<dyn KeyValueSlot>,
    scope: HistoryScope,
    documents: Arc<dyn DocumentStore>,
    require_login: bool,
    guard: SubmissionGuard,
}

impl QuizService {
    pub fn new(
        gateway: RequestGateway,
        slot: Arc<dyn KeyValueSlot>,
        scope: HistoryScope,
        documents: Arc<dyn DocumentStore>,
        require_login: bool,
    ) -> Self {
        Self {
            gateway,
            slot,
            scope,
            documents,
            require_login,
            guard: SubmissionGuard::default(),
        }
    }

    /// The history the given user sees, if the scope gives them one.
    pub fn history_for(&self, user: Option<&AuthUser>) -> Option<HistoryStore> {
        self.scope
            .slot_key(user)
            .map(|key| HistoryStore::new(self.slot.clone(), key))
    }

    pub async fn submit(
        &self,
        answers: AnswerSet,
        user: Option<&AuthUser>,
    ) -> Result<QuizOutcome, SubmitError> {
        if self.require_login && user.is_none() {
            return Err(SubmitError::Unauthorized);
        }
        answers.validate()?;

        let ticket = self.guard.try_begin().ok_or(SubmitError::InFlight)?;
        let submission_id = Uuid::new_v4();
        info!(%submission_id, sequence = ticket.sequence(), "Submitting quiz");

        let result = self
            .gateway
            .submit_quiz(&answers, user.map(|u| &u.uid))
            .await?;

        let jobs = build_display_list(&result.best_match, &result.alternatives, DISPLAY_SLOTS);
        let rows = display_rows(&jobs);
        let ai_summary = ai_summary_or_default(&result.ai_summary).to_string();

        let history_entry = self.record_history(user, &result).await;
        let persistence =
            user.map(|u| self.spawn_persist(u, submission_id, &answers, &result));

        Ok(QuizOutcome {
            submission_id,
            sequence: ticket.sequence(),
            result,
            rows,
            ai_summary,
            history_entry,
            persistence,
        })
    }

    pub async fn clear_history(&self, user: Option<&AuthUser>) -> Result<(), SlotError> {
        match self.history_for(user) {
            Some(history) => history.clear().await,
            None => Ok(()),
        }
    }

    /// Recommendations stored by the API for this user. Failure degrades to
    /// [`RemoteHistory::Failed`]; it never fails the page.
    pub async fn previous_recommendations(&self, user: Option<&AuthUser>) -> RemoteHistory {
        let Some(user) = user else {
            return RemoteHistory::SignedOut;
        };
        match self.gateway.fetch_history(&user.uid).await {
            Ok(recommendations) => RemoteHistory::Loaded(recommendations),
            Err(e) => {
                warn!("Error fetching previous recommendations: {e}");
                RemoteHistory::Failed
            }
        }
    }

    async fn record_history(
        &self,
        user: Option<&AuthUser>,
        result: &RecommendationResult,
    ) -> Option<HistorySummary> {
        let history = self.history_for(user)?;

        let titles = result.job_titles();
        if titles.is_empty() {
            debug!("Recommendation has no job titles; nothing to remember");
            return None;
        }
        let entry = HistorySummary::new(titles.join(", "));

        match history.record(entry.clone()).await {
            Ok(()) => Some(entry),
            Err(e) => {
                warn!(key = history.key(), "Failed to record history entry: {e}");
                None
            }
        }
    }

    fn spawn_persist(
        &self,
        user: &AuthUser,
        submission_id: Uuid,
        answers: &AnswerSet,
        result: &RecommendationResult,
    ) -> JoinHandle<()> {
        let documents = self.documents.clone();
        let collection = quiz_responses_collection(&user.uid);
        let record = json!({
            "submission_id": submission_id,
            "uid": user.uid,
            "email": user.email,
            "submitted_at": Utc::now().to_rfc3339(),
            "answers": answers,
            "recommendation": result,
        });

        tokio::spawn(async move {
            match documents.add_document(&collection, record).await {
                Ok(document_id) => {
                    debug!(%submission_id, %document_id, "Quiz response saved")
                }
                Err(e) => warn!(%submission_id, "Failed to save quiz response: {e}"),
            }
        })
    }
}
