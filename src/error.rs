use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    /// Bad password, bad/expired/malformed token, wrong token type, or an
    /// unknown refresh token. Never discloses which factor failed.
    #[error("Invalid credentials")]
    InvalidCredentials,
    /// Lockout window active; carries the remaining duration for
    /// caller-side messaging.
    #[error("Account locked")]
    AccountLocked { retry_after_secs: i64 },
    /// A refresh token was presented after it had already been rotated or
    /// revoked. Clients see the same response as `InvalidCredentials`, but
    /// the condition is logged separately since it may indicate token theft.
    #[error("Refresh token reuse detected")]
    TokenReuseDetected,
    /// Structurally valid but subject-less token, or no token at all.
    #[error("Unauthenticated")]
    Unauthenticated,
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Internal server error")]
    Internal,
}

pub type Result<T> = std::result::Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::Database(e) => {
                tracing::error!(error = %e, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, json!({"error": "Internal server error"}))
            }
            Self::InvalidCredentials => {
                tracing::debug!("Authentication failed");
                (StatusCode::UNAUTHORIZED, json!({"error": "Unauthorized"}))
            }
            Self::TokenReuseDetected => {
                tracing::warn!("Refresh token reuse detected");
                (StatusCode::UNAUTHORIZED, json!({"error": "Unauthorized"}))
            }
            Self::Unauthenticated => {
                tracing::debug!("Missing or subject-less credentials");
                (StatusCode::UNAUTHORIZED, json!({"error": "Unauthorized"}))
            }
            Self::AccountLocked { retry_after_secs } => {
                tracing::debug!(retry_after_secs, "Account locked");
                (
                    StatusCode::LOCKED,
                    json!({"error": "Account locked", "retryAfterSecs": retry_after_secs}),
                )
            }
            Self::BadRequest(msg) => {
                tracing::debug!(message = %msg, "Bad request");
                (StatusCode::BAD_REQUEST, json!({"error": msg}))
            }
            Self::Conflict(msg) => {
                tracing::debug!(message = %msg, "Conflict");
                (StatusCode::CONFLICT, json!({"error": msg}))
            }
            Self::Internal => {
                tracing::error!("Internal server error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, json!({"error": "Internal server error"}))
            }
        };

        (status, Json(body)).into_response()
    }
}
