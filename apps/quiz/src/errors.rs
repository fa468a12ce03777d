use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

use crate::auth::AuthError;
use crate::gateway::RequestError;
use crate::history::slot::SlotError;
use crate::models::answers::ValidationError;
use crate::presentation::render::error_page;
use crate::quiz::service::SubmitError;

pub const MSG_UNAUTHORIZED: &str = "Please log in to submit the quiz.";
pub const MSG_TIMEOUT: &str = "Request timed out. Please try again.";
pub const MSG_FETCH_FAILED: &str = "Error fetching recommendation. Please try again.";
pub const MSG_IN_FLIGHT: &str = "A recommendation is already being generated.";

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`;
/// every variant renders as an HTML error page.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Submission already in flight")]
    InFlight,

    #[error("Recommendation request failed: {0}")]
    Request(#[from] RequestError),

    #[error("Login failed: {0}")]
    Login(AuthError),

    #[error("Sign up failed: {0}")]
    SignUp(AuthError),

    #[error("History store error: {0}")]
    Slot(#[from] SlotError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<SubmitError> for AppError {
    fn from(e: SubmitError) -> Self {
        match e {
            SubmitError::Unauthorized => AppError::Unauthorized,
            SubmitError::InFlight => AppError::InFlight,
            SubmitError::Validation(e) => AppError::Validation(e),
            SubmitError::Request(e) => AppError::Request(e),
        }
    }
}

impl AppError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            AppError::Validation(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, MSG_UNAUTHORIZED.to_string()),
            AppError::InFlight => (StatusCode::CONFLICT, MSG_IN_FLIGHT.to_string()),
            AppError::Request(RequestError::Timeout) => {
                (StatusCode::GATEWAY_TIMEOUT, MSG_TIMEOUT.to_string())
            }
            AppError::Request(e) => {
                tracing::error!("Recommendation request failed: {e}");
                (StatusCode::BAD_GATEWAY, MSG_FETCH_FAILED.to_string())
            }
            AppError::Login(e) => (StatusCode::BAD_REQUEST, format!("Login failed: {e}")),
            AppError::SignUp(e) => (StatusCode::BAD_REQUEST, format!("Sign up failed: {e}")),
            AppError::Slot(e) => {
                tracing::error!("History store error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Could not access your history.".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal server error occurred".to_string(),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        (status, Html(error_page(&message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::from(SubmitError::Unauthorized), StatusCode::UNAUTHORIZED, MSG_UNAUTHORIZED),
            (AppError::from(SubmitError::InFlight), StatusCode::CONFLICT, MSG_IN_FLIGHT),
            (AppError::Request(RequestError::Timeout), StatusCode::GATEWAY_TIMEOUT, MSG_TIMEOUT),
            (AppError::Request(RequestError::Http(503)), StatusCode::BAD_GATEWAY, MSG_FETCH_FAILED),
            (
                AppError::Request(RequestError::Transport("connection refused".into())),
                StatusCode::BAD_GATEWAY,
                MSG_FETCH_FAILED,
            ),
        ];
        for (error, status, message) in cases {
            assert_eq!(error.status_and_message(), (status, message.to_string()));
        }
    }

    #[test]
    fn test_http_status_is_not_shown_to_the_user() {
        let (_, message) = AppError::Request(RequestError::Http(503)).status_and_message();
        assert!(!message.contains("503"));
    }

    #[test]
    fn test_validation_message_names_the_field() {
        let error = AppError::from(ValidationError::MissingField("career_goal".into()));
        let (status, message) = error.status_and_message();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(message.contains("career_goal"));
    }

    #[test]
    fn test_auth_failures_are_prefixed() {
        let (_, login) = AppError::Login(AuthError::InvalidCredentials).status_and_message();
        assert_eq!(login, "Login failed: invalid email or password");
        let (_, signup) = AppError::SignUp(AuthError::EmailInUse).status_and_message();
        assert!(signup.starts_with("Sign up failed: "));
    }
}
