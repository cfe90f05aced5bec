//! Backend error taxonomy.
//!
//! Every fallible handler returns `ApiError`. On the REST surface the
//! error converts to a JSON response (see `conversion.rs`); on the
//! relay surface errors are logged and the offending event is dropped,
//! so no variant here ever travels over the real-time channel.

use axum::http::StatusCode;
use thiserror::Error;

/// Errors surfaced by the REST and relay layers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A conversation was requested for a participant pair that cannot
    /// exist (identical or empty identifiers).
    #[error("invalid participants: {message}")]
    InvalidParticipants { message: String },

    /// A message failed validation (empty content, missing sender, or a
    /// sender that is not part of the conversation).
    #[error("invalid message: {message}")]
    InvalidMessage { message: String },

    /// An unknown conversation or message id.
    #[error("not found: {message}")]
    NotFound { message: String },

    /// Failed credential check on the auth surface.
    #[error("unauthorized: {message}")]
    Unauthorized { message: String },

    /// Storage failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ApiError {
    pub fn invalid_participants(message: impl Into<String>) -> Self {
        Self::InvalidParticipants {
            message: message.into(),
        }
    }

    pub fn invalid_message(message: impl Into<String>) -> Self {
        Self::InvalidMessage {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// HTTP status code for this error.
    ///
    /// Storage failures map to 500 without leaking driver detail; the
    /// rest map to the usual 4xx codes.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidParticipants { .. } => StatusCode::BAD_REQUEST,
            Self::InvalidMessage { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Human-readable reason included in the response body.
    pub fn message(&self) -> String {
        match self {
            Self::InvalidParticipants { message }
            | Self::InvalidMessage { message }
            | Self::NotFound { message }
            | Self::Unauthorized { message } => message.clone(),
            // Internal detail stays in the logs.
            Self::Database(_) => "internal storage error".to_string(),
        }
    }
}
