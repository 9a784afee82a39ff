use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;

use crate::api::handlers;
use crate::history::HistoryStore;
use crate::orchestrator::JobOrchestrator;
use crate::prompt::PromptComposer;

pub struct AppState {
    pub orchestrator: Arc<JobOrchestrator>,
    pub history: Arc<HistoryStore>,
    pub composer: PromptComposer,
    /// Cancelled on server shutdown; every in-flight job polls a child token.
    pub shutdown: CancellationToken,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/styles", get(handlers::styles))
        .route("/compose", post(handlers::compose))
        .route("/generate", post(handlers::generate))
        .route("/history", get(handlers::list_history).delete(handlers::clear_history))
        .route("/history/:id", get(handlers::get_history_item).delete(handlers::delete_history_item))
        .route("/token/verify", post(handlers::verify_token))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
