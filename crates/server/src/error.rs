use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Errors surfaced through the HTTP API.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The request is malformed (e.g. missing notification headers).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// An internal failure while handling the request.
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = serde_json::json!({ "error": message });

        (status, axum::Json(body)).into_response()
    }
}
