//! Axum route handlers for the quiz pages and auth actions.

use axum::{
    extract::{RawForm, State},
    response::{Html, Redirect},
    Form,
};
use serde::Deserialize;
use tracing::info;

use crate::errors::{AppError, MSG_UNAUTHORIZED};
use crate::models::answers::AnswerSet;
use crate::presentation::render::{history_page, quiz_page, result_page};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SignUpForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub display_name: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /
pub async fn handle_index(State(state): State<AppState>) -> Html<String> {
    let user = state.auth.current_user();
    let notice = (state.config.require_login && user.is_none()).then_some(MSG_UNAUTHORIZED);
    Html(quiz_page(user.as_ref(), notice))
}

/// POST /quiz
///
/// Form body with repeated keys for multi-select questions. Renders the
/// five-row result on success; every failure renders an error page.
pub async fn handle_submit_quiz(
    State(state): State<AppState>,
    RawForm(body): RawForm,
) -> Result<Html<String>, AppError> {
    let user = state.auth.current_user();
    let answers = AnswerSet::from_form(&body)?;
    let outcome = state.quiz.submit(answers, user.as_ref()).await?;
    info!(
        submission_id = %outcome.submission_id,
        sequence = outcome.sequence,
        best_match = %outcome.result.best_match.job_title,
        recorded = outcome.history_entry.is_some(),
        persisting = outcome.persistence.is_some(),
        "Quiz answered"
    );

    Ok(Html(result_page(
        user.as_ref(),
        &outcome.rows,
        &outcome.ai_summary,
    )))
}

/// GET /history
///
/// Local history plus the API's stored recommendations. A failed remote
/// fetch degrades to a message; it never fails the page.
pub async fn handle_history(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let user = state.auth.current_user();

    let local = match state.quiz.history_for(user.as_ref()) {
        Some(history) => Some(history.list().await?),
        None => None,
    };
    let remote = state.quiz.previous_recommendations(user.as_ref()).await;

    Ok(Html(history_page(user.as_ref(), local.as_deref(), &remote)))
}

/// POST /history/clear
pub async fn handle_clear_history(State(state): State<AppState>) -> Result<Redirect, AppError> {
    let user = state.auth.current_user();
    state.quiz.clear_history(user.as_ref()).await?;
    Ok(Redirect::to("/history"))
}

/// POST /auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Redirect, AppError> {
    state
        .auth
        .sign_in(&form.email, &form.password)
        .await
        .map_err(AppError::Login)?;
    Ok(Redirect::to("/"))
}

/// POST /auth/signup
pub async fn handle_sign_up(
    State(state): State<AppState>,
    Form(form): Form<SignUpForm>,
) -> Result<Redirect, AppError> {
    state
        .auth
        .sign_up(&form.email, &form.password, &form.display_name)
        .await
        .map_err(AppError::SignUp)?;
    Ok(Redirect::to("/"))
}

/// POST /auth/logout
pub async fn handle_logout(State(state): State<AppState>) -> Result<Redirect, AppError> {
    state
        .auth
        .sign_out()
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    Ok(Redirect::to("/"))
}
