//! Enrollment Assistant Server
//!
//! HTTP endpoints for chat sessions, stored leads, and analytics.

pub mod http;
pub mod metrics;
pub mod session;
pub mod state;

pub use http::create_router;
pub use metrics::{init_metrics, record_turn};
pub use session::{ChatSession, SessionManager};
pub use state::AppState;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Session not found: {0}")]
    Session(String),

    #[error("Session limit reached")]
    Capacity,

    /// A reply is still being composed for this session
    #[error("Reply pending, try again shortly")]
    ReplyPending,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ServerError> for StatusCode {
    fn from(err: ServerError) -> Self {
        match err {
            ServerError::Session(_) => StatusCode::NOT_FOUND,
            ServerError::Capacity => StatusCode::SERVICE_UNAVAILABLE,
            ServerError::ReplyPending => StatusCode::CONFLICT,
            ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let status = StatusCode::from(self);
        if status.is_server_error() {
            tracing::error!(%status, error = %message, "Request failed");
        }
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<enrollment_agent_core::Error> for ServerError {
    fn from(err: enrollment_agent_core::Error) -> Self {
        ServerError::Persistence(err.to_string())
    }
}
