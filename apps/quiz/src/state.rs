use std::sync::Arc;

use crate::auth::AuthProvider;
use crate::config::Config;
use crate::quiz::service::QuizService;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub quiz: Arc<QuizService>,
    /// Pluggable auth backend. Default: LocalAuthProvider.
    pub auth: Arc<dyn AuthProvider>,
}
