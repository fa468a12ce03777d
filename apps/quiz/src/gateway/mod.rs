//! Recommendation gateway: the only module that talks to the recommendation API.
//!
//! Every call races the whole exchange (send + body) against a client-side
//! deadline; on expiry the in-flight request is dropped. Nothing is retried:
//! each error is terminal for that call and the user resubmits.

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::answers::AnswerSet;
use crate::models::recommendation::{HistoryResponse, RecommendationResult, StoredRecommendation};
use crate::models::user::UserId;

pub const RECOMMEND_PATH: &str = "/api/recommend";
pub const HISTORY_PATH: &str = "/api/recommendations";
pub const TOP_K: u32 = 5;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RequestError {
    #[error("request timed out")]
    Timeout,

    #[error("recommendation API returned HTTP {0}")]
    Http(u16),

    #[error("transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for RequestError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            RequestError::Timeout
        } else {
            RequestError::Transport(e.to_string())
        }
    }
}

#[derive(Debug, Serialize)]
struct RecommendPayload<'a> {
    user_input: &'a str,
    answers: &'a AnswerSet,
    top_k: u32,
    explain: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<&'a UserId>,
}

impl<'a> RecommendPayload<'a> {
    fn new(answers: &'a AnswerSet, identity: Option<&'a UserId>) -> Self {
        Self {
            user_input: answers.career_goal(),
            answers,
            top_k: TOP_K,
            explain: true,
            user_id: identity,
        }
    }
}

/// Client for the recommendation API. Cheap to clone.
#[derive(Clone)]
pub struct RequestGateway {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl RequestGateway {
    /// `client` is injected so callers control pooling and TLS; the deadline
    /// is enforced here, not by the client.
    pub fn new(client: Client, base_url: &str, timeout: Duration) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// POSTs the answers to `/api/recommend` and parses the ranked result.
    pub async fn submit_quiz(
        &self,
        answers: &AnswerSet,
        identity: Option<&UserId>,
    ) -> Result<RecommendationResult, RequestError> {
        let payload = RecommendPayload::new(answers, identity);
        let request = self.client.post(self.endpoint(RECOMMEND_PATH)).json(&payload);

        let result: RecommendationResult = self.exchange(request).await?;

        debug!(
            best_match = %result.best_match.job_title,
            alternatives = result.alternatives.len(),
            "Recommendation received"
        );
        Ok(result)
    }

    /// GETs previously stored recommendations for `user_id`.
    pub async fn fetch_history(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<StoredRecommendation>, RequestError> {
        let url = format!("{}/{}", self.endpoint(HISTORY_PATH), user_id);
        let response: HistoryResponse = self.exchange(self.client.get(url)).await?;
        Ok(response.recommendations)
    }

    async fn exchange<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, RequestError> {
        let call = async {
            let response = request.send().await?;

            let status = response.status();
            if !status.is_success() {
                warn!("Recommendation API returned {status}");
                return Err(RequestError::Http(status.as_u16()));
            }

            let body = response.bytes().await?;
            serde_json::from_slice::<T>(&body)
                .map_err(|e| RequestError::Transport(format!("malformed response body: {e}")))
        };

        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(parsed)) => Ok(parsed),
            Ok(Err(e)) => {
                if !matches!(e, RequestError::Http(_)) {
                    warn!("Recommendation API call failed: {e}");
                }
                Err(e)
            }
            Err(_) => {
                warn!(
                    "Recommendation API call exceeded {}ms; request cancelled",
                    self.timeout.as_millis()
                );
                Err(RequestError::Timeout)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::answers::CAREER_GOAL;
    use crate::test_support::spawn_stub;
    use axum::{extract::State, http::StatusCode, routing::get, routing::post, Json, Router};
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};
    use std::time::Instant;

    fn gateway(base_url: &str, timeout: Duration) -> RequestGateway {
        RequestGateway::new(Client::new(), base_url, timeout)
    }

    fn answers() -> AnswerSet {
        AnswerSet::default().with(CAREER_GOAL, "data")
    }

    #[test]
    fn test_payload_shape() {
        let answers = answers();
        let uid = UserId::new("u-1");

        let with_user = serde_json::to_value(RecommendPayload::new(&answers, Some(&uid))).unwrap();
        assert_eq!(
            with_user,
            json!({
                "user_input": "data",
                "answers": { "career_goal": "data" },
                "top_k": 5,
                "explain": true,
                "user_id": "u-1"
            })
        );

        let anonymous = serde_json::to_value(RecommendPayload::new(&answers, None)).unwrap();
        assert!(anonymous.get("user_id").is_none());
    }

    #[test]
    fn test_user_input_defaults_to_empty() {
        let empty = AnswerSet::default();
        let payload = serde_json::to_value(RecommendPayload::new(&empty, None)).unwrap();
        assert_eq!(payload["user_input"], "");
    }

    #[test]
    fn test_base_url_trailing_slash_is_ignored() {
        let gw = gateway("https://api.example.com/", DEFAULT_TIMEOUT);
        assert_eq!(gw.endpoint(RECOMMEND_PATH), "https://api.example.com/api/recommend");
    }

    #[tokio::test]
    async fn test_valid_response_is_parsed() {
        let received: Arc<Mutex<Option<Value>>> = Arc::default();
        let app = Router::new()
            .route(
                RECOMMEND_PATH,
                post(
                    |State(seen): State<Arc<Mutex<Option<Value>>>>, Json(body): Json<Value>| async move {
                        *seen.lock().unwrap() = Some(body);
                        Json(json!({
                            "best_match": { "job_title": "Data Analyst", "description": "Analyzes data..." },
                            "alternatives": [{ "job_title": "BI Developer", "description": "Builds dashboards." }],
                            "ai_summary": "Good fit"
                        }))
                    },
                ),
            )
            .with_state(received.clone());
        let base = spawn_stub(app).await;

        let uid = UserId::new("u-9");
        let result = gateway(&base, DEFAULT_TIMEOUT)
            .submit_quiz(&answers(), Some(&uid))
            .await
            .unwrap();

        assert_eq!(result.best_match.job_title, "Data Analyst");
        assert_eq!(result.alternatives[0].job_title, "BI Developer");
        assert_eq!(result.ai_summary, "Good fit");

        let body = received.lock().unwrap().clone().unwrap();
        assert_eq!(body["user_id"], "u-9");
        assert_eq!(body["top_k"], 5);
    }

    #[tokio::test]
    async fn test_http_500_is_classified() {
        let app = Router::new().route(
            RECOMMEND_PATH,
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let base = spawn_stub(app).await;

        let err = gateway(&base, DEFAULT_TIMEOUT)
            .submit_quiz(&answers(), None)
            .await
            .unwrap_err();
        assert_eq!(err, RequestError::Http(500));
    }

    #[tokio::test]
    async fn test_unresponsive_backend_times_out_at_deadline() {
        let app = Router::new().route(
            RECOMMEND_PATH,
            post(|| async { std::future::pending::<&'static str>().await }),
        );
        let base = spawn_stub(app).await;
        let deadline = Duration::from_millis(300);

        let started = Instant::now();
        let err = gateway(&base, deadline)
            .submit_quiz(&answers(), None)
            .await
            .unwrap_err();
        let elapsed = started.elapsed();

        assert_eq!(err, RequestError::Timeout);
        assert!(elapsed >= deadline, "resolved early after {elapsed:?}");
        assert!(elapsed < Duration::from_secs(3), "resolved late after {elapsed:?}");
    }

    #[tokio::test]
    async fn test_malformed_body_is_transport_error() {
        let app = Router::new().route(RECOMMEND_PATH, post(|| async { "<html>oops</html>" }));
        let base = spawn_stub(app).await;

        let err = gateway(&base, DEFAULT_TIMEOUT)
            .submit_quiz(&answers(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, RequestError::Transport(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_error_object_body_is_transport_error() {
        let app = Router::new().route(
            RECOMMEND_PATH,
            post(|| async { Json(json!({ "error": "OpenAI client not initialized" })) }),
        );
        let base = spawn_stub(app).await;

        let err = gateway(&base, DEFAULT_TIMEOUT)
            .submit_quiz(&answers(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, RequestError::Transport(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = gateway(&format!("http://{addr}"), DEFAULT_TIMEOUT)
            .submit_quiz(&answers(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, RequestError::Transport(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_fetch_history_reads_user_recommendations() {
        let app = Router::new().route(
            "/api/recommendations/:user_id",
            get(|axum::extract::Path(user_id): axum::extract::Path<String>| async move {
                Json(json!({
                    "recommendations": [{
                        "best_match": { "job_title": format!("Role for {user_id}") },
                        "alternatives": [],
                        "ai_summary": "Fine",
                        "timestamp": "2024-07-15T12:00:00.000123"
                    }]
                }))
            }),
        );
        let base = spawn_stub(app).await;

        let history = gateway(&base, DEFAULT_TIMEOUT)
            .fetch_history(&UserId::new("abc"))
            .await
            .unwrap();

        assert_eq!(history.len(), 1);
        assert_eq!(
            history[0].best_match.as_ref().unwrap().job_title,
            "Role for abc"
        );
    }

    #[tokio::test]
    async fn test_fetch_history_not_found_is_http_error() {
        let base = spawn_stub(Router::new()).await;
        let err = gateway(&base, DEFAULT_TIMEOUT)
            .fetch_history(&UserId::new("abc"))
            .await
            .unwrap_err();
        assert_eq!(err, RequestError::Http(404));
    }
}
