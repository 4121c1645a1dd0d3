use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use tracing::{debug, info, instrument, warn};

use docshelf_ingest::{IntakeOutcome, Notification};

use super::AppState;
use crate::error::ServerError;

const CHANNEL_ID_HEADER: &str = "x-goog-channel-id";
const CHANNEL_TOKEN_HEADER: &str = "x-goog-channel-token";
const RESOURCE_STATE_HEADER: &str = "x-goog-resource-state";
const MESSAGE_NUMBER_HEADER: &str = "x-goog-message-number";

/// `POST /notifications` -- receive one push notification.
///
/// The provider retries deliveries that do not get a prompt 2xx, so the
/// handler only validates headers and acknowledges; change-feed resolution
/// runs on a detached task and reports through its own logging.
#[instrument(skip_all)]
pub async fn notify(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, ServerError> {
    let notification = parse_notification(&headers)?;

    tokio::spawn(async move {
        match state.intake.handle(&notification).await {
            Ok(IntakeOutcome::Enqueued { enqueued }) => {
                info!(enqueued, "notification resolved");
            }
            Ok(IntakeOutcome::Handshake) => debug!("channel handshake acknowledged"),
            Ok(IntakeOutcome::Discarded(reason)) => {
                debug!(?reason, "notification discarded");
            }
            Err(e) => warn!(error = %e, "notification resolution failed"),
        }
    });

    Ok(StatusCode::OK)
}

fn parse_notification(headers: &HeaderMap) -> Result<Notification, ServerError> {
    Ok(Notification {
        channel_id: require_header(headers, CHANNEL_ID_HEADER)?,
        token: header_value(headers, CHANNEL_TOKEN_HEADER).unwrap_or_default(),
        resource_state: require_header(headers, RESOURCE_STATE_HEADER)?,
        message_number: header_value(headers, MESSAGE_NUMBER_HEADER)
            .unwrap_or_else(|| "0".to_owned()),
    })
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}

fn require_header(headers: &HeaderMap, name: &str) -> Result<String, ServerError> {
    header_value(headers, name)
        .ok_or_else(|| ServerError::BadRequest(format!("missing {name} header")))
}
