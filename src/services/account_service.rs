use crate::domain::lockout::{self, LockoutCheck};
use crate::domain::session::AuthSession;
use crate::error::{AppError, Result};
use crate::services::auth_service::AuthService;
use crate::storage::DbPool;
use crate::storage::user_repo::UserRepository;
use opentelemetry::{global, metrics::Counter};
use std::fmt;
use time::OffsetDateTime;

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Clone)]
struct AccountMetrics {
    users_registered_total: Counter<u64>,
    login_total: Counter<u64>,
    lockout_total: Counter<u64>,
}

impl AccountMetrics {
    fn new() -> Self {
        let meter = global::meter("peerlend-server");
        Self {
            users_registered_total: meter
                .u64_counter("users_registered_total")
                .with_description("Total number of successful user registrations")
                .build(),
            login_total: meter
                .u64_counter("auth_login_total")
                .with_description("Total number of successful login attempts")
                .build(),
            lockout_total: meter
                .u64_counter("auth_lockout_total")
                .with_description("Total number of accounts entering the lockout window")
                .build(),
        }
    }
}

/// Credential lifecycle: registration, login with lockout enforcement,
/// logout.
#[derive(Clone)]
pub struct AccountService {
    pool: DbPool,
    user_repo: UserRepository,
    auth_service: AuthService,
    metrics: AccountMetrics,
}

impl fmt::Debug for AccountService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountService").finish_non_exhaustive()
    }
}

impl AccountService {
    pub fn new(pool: DbPool, user_repo: UserRepository, auth_service: AuthService) -> Self {
        Self {
            pool,
            user_repo,
            auth_service,
            metrics: AccountMetrics::new(),
        }
    }

    #[tracing::instrument(
        skip(self, email, password),
        fields(user_id = tracing::field::Empty),
        err(level = "warn")
    )]
    pub async fn register(&self, email: String, password: String) -> Result<AuthSession> {
        if password.len() < MIN_PASSWORD_LEN {
            return Err(AppError::BadRequest(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let password_hash = self.auth_service.hash_password(&password).await?;

        let mut tx = self.pool.begin().await?;
        let user = self.user_repo.create(&mut *tx, &email, &password_hash).await?;
        tracing::Span::current().record("user_id", tracing::field::display(user.id));

        let session = self.auth_service.create_session(&mut tx, user.id).await?;
        tx.commit().await?;

        tracing::info!("User registered successfully");
        self.metrics.users_registered_total.add(1, &[]);

        Ok(session)
    }

    /// Authenticates an email/password pair.
    ///
    /// The whole read-modify-write runs inside one transaction with the
    /// credential row locked, so concurrent attempts serialize. The lock
    /// window is checked before the password hash is consulted; the failure
    /// that reaches the threshold still surfaces `InvalidCredentials`, and
    /// `AccountLocked` is returned from the next attempt onward.
    #[tracing::instrument(
        skip(self, email, password),
        fields(user_id = tracing::field::Empty),
        err(level = "warn")
    )]
    pub async fn login(&self, email: String, password: String) -> Result<AuthSession> {
        let mut tx = self.pool.begin().await?;

        let user = match self.user_repo.find_by_email_for_update(&mut tx, &email).await? {
            Some(u) => u,
            None => {
                tracing::warn!("Login failed: user not found");
                return Err(AppError::InvalidCredentials);
            }
        };

        tracing::Span::current().record("user_id", tracing::field::display(user.id));

        let now = OffsetDateTime::now_utc();
        if let LockoutCheck::Locked { retry_after_secs } = lockout::check(user.locked_until, now) {
            tracing::warn!(retry_after_secs, "Login rejected: account locked");
            return Err(AppError::AccountLocked { retry_after_secs });
        }

        let is_valid = self.auth_service.verify_password(&password, &user.password_hash).await?;

        if !is_valid {
            let transition = lockout::on_failed_attempt(user.failed_login_count, user.locked_until, now);
            self.user_repo
                .record_login_failure(&mut *tx, user.id, transition.failed_login_count, transition.locked_until)
                .await?;
            tx.commit().await?;

            if transition.locked_until.is_some() {
                tracing::warn!(
                    failed_login_count = transition.failed_login_count,
                    "Login failed: lockout window engaged"
                );
                self.metrics.lockout_total.add(1, &[]);
            } else {
                tracing::warn!(
                    failed_login_count = transition.failed_login_count,
                    "Login failed: invalid password"
                );
            }
            return Err(AppError::InvalidCredentials);
        }

        if user.failed_login_count > 0 || user.locked_until.is_some() {
            self.user_repo.clear_login_failures(&mut *tx, user.id).await?;
        }

        let session = self.auth_service.create_session(&mut tx, user.id).await?;
        tx.commit().await?;

        tracing::info!("User logged in successfully");
        self.metrics.login_total.add(1, &[]);

        Ok(session)
    }

    #[tracing::instrument(
        skip(self, refresh_token),
        fields(user_id = tracing::field::Empty),
        err(level = "warn")
    )]
    pub async fn refresh(&self, refresh_token: String) -> Result<AuthSession> {
        self.auth_service.refresh_session(&self.pool, refresh_token).await
    }

    #[tracing::instrument(err, skip(self, refresh_token), fields(user_id = %user_id))]
    pub async fn logout(&self, user_id: i64, refresh_token: String) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        self.auth_service.revoke_session(&mut conn, user_id, refresh_token).await?;
        tracing::info!("User logged out");
        Ok(())
    }
}
