use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;
use uuid::Uuid;

/// Type tag carried inside the signed envelope. A refresh token must never
/// be accepted where an access token is expected, and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Access => f.write_str("access"),
            Self::Refresh => f.write_str("refresh"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    pub exp: i64,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    /// Unique token id. Refresh tokens are stored and compared by literal
    /// value, and `exp` has second granularity, so two tokens minted in the
    /// same second must still differ.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

impl Claims {
    pub fn new(user_id: i64, token_type: TokenType, expires_at: OffsetDateTime) -> Self {
        Self {
            sub: Some(user_id.to_string()),
            exp: expires_at.unix_timestamp(),
            token_type,
            jti: Some(Uuid::new_v4().to_string()),
        }
    }

    pub fn verify_type(&self, expected: TokenType) -> bool {
        self.token_type == expected
    }

    /// Returns the user id carried in `sub`.
    ///
    /// # Errors
    /// `Unauthenticated` when the subject is absent, empty, or not a user id.
    pub fn subject(&self) -> Result<i64> {
        self.sub
            .as_deref()
            .and_then(|s| s.parse().ok())
            .ok_or(AppError::Unauthenticated)
    }
}
