use crate::domain::session::RefreshToken;
use crate::error::{AppError, Result};
use crate::storage::records::auth::RefreshTokenRecord;
use sqlx::{Executor, PgConnection, Postgres};
use time::OffsetDateTime;

#[derive(Clone, Debug, Default)]
pub struct RefreshTokenRepository {}

impl RefreshTokenRepository {
    pub fn new() -> Self {
        Self {}
    }

    /// Persists a newly issued refresh token. The literal token string is
    /// the stored credential, looked up by exact value.
    pub async fn create<'e, E>(&self, executor: E, token: &str, user_id: i64, expires_at: OffsetDateTime) -> Result<()>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("INSERT INTO refresh_tokens (token, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(token)
            .bind(user_id)
            .bind(expires_at)
            .execute(executor)
            .await
            .map_err(AppError::Database)?;

        Ok(())
    }

    /// Fetches a refresh token record with a row lock. Concurrent rotation
    /// attempts serialize here; the loser observes `revoked = TRUE`.
    pub async fn find_for_update(&self, conn: &mut PgConnection, token: &str) -> Result<Option<RefreshToken>> {
        let record: Option<RefreshTokenRecord> = sqlx::query_as(
            r#"
            SELECT token, user_id, expires_at, revoked, revoked_at, created_at
            FROM refresh_tokens
            WHERE token = $1
            FOR UPDATE
            "#,
        )
        .bind(token)
        .fetch_optional(&mut *conn)
        .await
        .map_err(AppError::Database)?;

        Ok(record.map(Into::into))
    }

    /// Marks a token revoked (one-way). Returns the number of rows that
    /// transitioned, which is zero if the token was already revoked.
    pub async fn revoke(&self, conn: &mut PgConnection, token: &str) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET revoked = TRUE, revoked_at = now() WHERE token = $1 AND revoked = FALSE",
        )
        .bind(token)
        .execute(&mut *conn)
        .await
        .map_err(AppError::Database)?;

        Ok(result.rows_affected())
    }

    /// Revokes a specific refresh token owned by the user (logout). Records
    /// are never deleted; they are retained for audit.
    pub async fn revoke_owned<'e, E>(&self, executor: E, token: &str, user_id: i64) -> Result<()>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked = TRUE, revoked_at = now()
            WHERE token = $1 AND user_id = $2 AND revoked = FALSE
            "#,
        )
        .bind(token)
        .bind(user_id)
        .execute(executor)
        .await
        .map_err(AppError::Database)?;

        Ok(())
    }
}
