use crate::domain::user::User;
use crate::error::{AppError, Result};
use crate::storage::records::user::UserRecord;
use sqlx::{Executor, PgConnection, Postgres};
use time::OffsetDateTime;

#[derive(Clone, Debug, Default)]
pub struct UserRepository {}

impl UserRepository {
    pub fn new() -> Self {
        Self {}
    }

    /// Creates a credential record.
    ///
    /// # Errors
    /// `Conflict` when the email is already registered.
    pub async fn create<'e, E>(&self, executor: E, email: &str, password_hash: &str) -> Result<User>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let record: UserRecord = sqlx::query_as(
            r#"
            INSERT INTO users (email, password_hash)
            VALUES ($1, $2)
            RETURNING id, email, password_hash, failed_login_count, locked_until, created_at
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .fetch_one(executor)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Conflict("email already registered".to_string())
            }
            _ => AppError::Database(e),
        })?;

        Ok(record.into())
    }

    /// Fetches a credential record with a row lock, so the lockout
    /// read-modify-write serializes with concurrent attempts.
    pub async fn find_by_email_for_update(&self, conn: &mut PgConnection, email: &str) -> Result<Option<User>> {
        let record: Option<UserRecord> = sqlx::query_as(
            r#"
            SELECT id, email, password_hash, failed_login_count, locked_until, created_at
            FROM users
            WHERE email = $1
            FOR UPDATE
            "#,
        )
        .bind(email)
        .fetch_optional(&mut *conn)
        .await
        .map_err(AppError::Database)?;

        Ok(record.map(Into::into))
    }

    /// Persists the lockout transition computed for a failed attempt.
    pub async fn record_login_failure<'e, E>(
        &self,
        executor: E,
        user_id: i64,
        failed_login_count: i32,
        locked_until: Option<OffsetDateTime>,
    ) -> Result<()>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE users SET failed_login_count = $2, locked_until = $3 WHERE id = $1")
            .bind(user_id)
            .bind(failed_login_count)
            .bind(locked_until)
            .execute(executor)
            .await
            .map_err(AppError::Database)?;

        Ok(())
    }

    /// Resets the failure counter and clears the lock on successful login.
    pub async fn clear_login_failures<'e, E>(&self, executor: E, user_id: i64) -> Result<()>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE users SET failed_login_count = 0, locked_until = NULL WHERE id = $1")
            .bind(user_id)
            .execute(executor)
            .await
            .map_err(AppError::Database)?;

        Ok(())
    }
}
