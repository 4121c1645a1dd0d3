use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;

use docshelf_ingest::WatchMode;

use super::AppState;

/// Response body for `GET /healthz`.
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    /// `"push"` while a channel is active, `"polling"` otherwise.
    watch_mode: &'static str,
    /// Lease end of the active channel, RFC 3339.
    channel_expires_at: Option<String>,
}

/// `GET /healthz` -- liveness plus the current watch mode.
pub async fn healthz(State(state): State<AppState>) -> impl IntoResponse {
    let ingest = state.ingest.lock().await;

    let body = HealthResponse {
        status: "ok",
        watch_mode: match ingest.mode() {
            WatchMode::Push => "push",
            WatchMode::Polling => "polling",
        },
        channel_expires_at: ingest.channel().map(|c| c.expires_at.to_rfc3339()),
    };

    (StatusCode::OK, Json(body))
}
