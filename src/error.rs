//! Error types for booking operations.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::DbErr;
use serde_json::json;
use uuid::Uuid;

use crate::entity::session::SessionStatus;

/// Result alias used throughout the ledger and API.
pub type Result<T, E = BookingError> = std::result::Result<T, E>;

/// Everything a booking operation can report to its caller.
///
/// Meeting-provider and notification failures never appear here: the
/// provisioner and notifier absorb them.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    /// Malformed or missing input.
    #[error("{0}")]
    Validation(String),

    #[error("Mentor not found")]
    MentorNotFound(Uuid),

    #[error("Session not found")]
    SessionNotFound(Uuid),

    /// The target user is not an approved, active mentor.
    #[error("Invalid or unapproved mentor")]
    InvalidMentor(Uuid),

    #[error("Time slot already booked or pending")]
    Conflict { existing: Uuid },

    #[error("Not authorized")]
    Forbidden,

    #[error("Authentication required")]
    Unauthenticated,

    /// The operation is not legal from the session's current status.
    #[error("Cannot {action} a {status} session")]
    InvalidState {
        action: &'static str,
        status: SessionStatus,
    },

    #[error("database error: {0}")]
    Database(#[from] DbErr),

    #[error("session store error: {0}")]
    SessionStore(String),
}

impl BookingError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            BookingError::Validation(_)
            | BookingError::InvalidMentor(_)
            | BookingError::Conflict { .. }
            | BookingError::InvalidState { .. } => StatusCode::BAD_REQUEST,
            BookingError::MentorNotFound(_) | BookingError::SessionNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            BookingError::Forbidden => StatusCode::FORBIDDEN,
            BookingError::Unauthenticated => StatusCode::UNAUTHORIZED,
            BookingError::Database(_) | BookingError::SessionStore(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for BookingError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "booking request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };
        (status, Json(json!({ "message": message }))).into_response()
    }
}

impl From<tower_sessions::session::Error> for BookingError {
    fn from(e: tower_sessions::session::Error) -> Self {
        BookingError::SessionStore(e.to_string())
    }
}
