pub mod health;

use axum::{
    extract::Request,
    http::{header, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tracing::warn;

use crate::quiz::handlers;
use crate::state::AppState;

/// `host[:port]` of an `Origin` header value; `None` for `null` or garbage.
fn origin_authority(origin: &str) -> Option<String> {
    let url = url::Url::parse(origin).ok()?;
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

/// Rejects cross-site form posts: a state-changing request carrying an
/// `Origin` must come from the host it is addressed to.
async fn same_origin_only(request: Request, next: Next) -> Response {
    if request.method() != Method::GET && request.method() != Method::HEAD {
        let headers = request.headers();
        if let Some(origin) = headers.get(header::ORIGIN) {
            let host = headers.get(header::HOST).and_then(|h| h.to_str().ok());
            let origin = origin.to_str().ok().and_then(origin_authority);
            if host.is_none() || origin.as_deref() != host {
                warn!(?origin, ?host, "Rejected cross-origin {} {}", request.method(), request.uri());
                return StatusCode::FORBIDDEN.into_response();
            }
        }
    }
    next.run(request).await
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/", get(handlers::handle_index))
        .route("/quiz", post(handlers::handle_submit_quiz))
        .route("/history", get(handlers::handle_history))
        .route("/history/clear", post(handlers::handle_clear_history))
        .route("/auth/login", post(handlers::handle_login))
        .route("/auth/signup", post(handlers::handle_sign_up))
        .route("/auth/logout", post(handlers::handle_logout))
        .layer(middleware::from_fn(same_origin_only))
        .with_state(state)
}
