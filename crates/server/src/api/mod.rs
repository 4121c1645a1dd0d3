pub mod health;
pub mod notifications;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;

use docshelf_ingest::{ChangeIntake, IngestState};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Notification intake, shared with the poller.
    pub intake: Arc<ChangeIntake>,
    /// Watch-session state, read by the health endpoint.
    pub ingest: Arc<Mutex<IngestState>>,
}

/// Build the Axum router with all routes and middleware.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health::healthz))
        .route("/notifications", post(notifications::notify))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
