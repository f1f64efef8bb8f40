use crate::config::AuthConfig;
use crate::domain::password;
use crate::domain::session::AuthSession;
use crate::domain::token::{Claims, TokenType};
use crate::error::{AppError, Result};
use crate::storage::DbPool;
use crate::storage::refresh_token_repo::RefreshTokenRepository;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use opentelemetry::{global, metrics::Counter};
use sqlx::PgConnection;
use std::fmt;
use time::{Duration, OffsetDateTime};

#[derive(Clone)]
struct Metrics {
    refresh_total: Counter<u64>,
    logout_total: Counter<u64>,
    token_reuse_total: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("peerlend-server");
        Self {
            refresh_total: meter
                .u64_counter("auth_refresh_total")
                .with_description("Total number of successful token rotations")
                .build(),
            logout_total: meter
                .u64_counter("auth_logout_total")
                .with_description("Total number of successful logout attempts")
                .build(),
            token_reuse_total: meter
                .u64_counter("auth_token_reuse_total")
                .with_description("Total number of rotated refresh tokens presented again")
                .build(),
        }
    }
}

/// Session authority: mints and validates signed bearer tokens and manages
/// refresh-token rotation and revocation. Configuration is injected at
/// construction and immutable afterwards.
#[derive(Clone)]
pub struct AuthService {
    config: AuthConfig,
    header: Header,
    validation: Validation,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    refresh_repo: RefreshTokenRepository,
    metrics: Metrics,
}

impl fmt::Debug for AuthService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthService").finish_non_exhaustive()
    }
}

impl AuthService {
    /// Builds the service, fixing the signing key and algorithm for the
    /// process lifetime.
    ///
    /// # Errors
    /// Fails on an unknown or non-HMAC algorithm name.
    pub fn new(config: AuthConfig, refresh_repo: RefreshTokenRepository) -> anyhow::Result<Self> {
        let algorithm: Algorithm = config
            .jwt_algorithm
            .parse()
            .map_err(|_| anyhow::anyhow!("unknown JWT algorithm: {}", config.jwt_algorithm))?;

        if !matches!(algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
            anyhow::bail!("unsupported JWT algorithm: {}, expected an HMAC variant", config.jwt_algorithm);
        }

        let encoding_key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

        Ok(Self {
            header: Header::new(algorithm),
            validation: Validation::new(algorithm),
            encoding_key,
            decoding_key,
            config,
            refresh_repo,
            metrics: Metrics::new(),
        })
    }

    /// Mints an access token for the user. Pure function of input plus the
    /// signing key; no side effects.
    ///
    /// # Errors
    /// `Internal` if signing fails.
    pub fn issue_access_token(&self, user_id: i64, ttl: Option<Duration>) -> Result<String> {
        let ttl = ttl.unwrap_or_else(|| Duration::minutes(self.config.access_token_ttl_mins));
        self.sign(&Claims::new(user_id, TokenType::Access, OffsetDateTime::now_utc() + ttl))
    }

    /// Mints a refresh token. The caller is responsible for persisting the
    /// corresponding store record; see [`Self::create_session`].
    ///
    /// # Errors
    /// `Internal` if signing fails.
    pub fn issue_refresh_token(&self, user_id: i64, ttl: Option<Duration>) -> Result<String> {
        let ttl = ttl.unwrap_or_else(|| Duration::days(self.config.refresh_token_ttl_days));
        self.sign(&Claims::new(user_id, TokenType::Refresh, OffsetDateTime::now_utc() + ttl))
    }

    /// Verifies signature and expiry, returning the envelope. An unverified
    /// payload is never partially trusted.
    ///
    /// # Errors
    /// `InvalidCredentials` on bad signature, malformed structure or expiry.
    pub fn decode_token(&self, token: &str) -> Result<Claims> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| AppError::InvalidCredentials)
    }

    /// Decodes the token and checks the type tag before extracting the
    /// subject.
    ///
    /// # Errors
    /// `InvalidCredentials` on verification failure or type mismatch;
    /// `Unauthenticated` when the verified envelope carries no usable
    /// subject. Both surface as authentication failures to the client but
    /// stay distinguishable for logging.
    pub fn get_subject(&self, token: &str, expected_type: TokenType) -> Result<i64> {
        let claims = self.decode_token(token)?;

        if !claims.verify_type(expected_type) {
            tracing::debug!(
                expected = %expected_type,
                got = %claims.token_type,
                "Token type mismatch"
            );
            return Err(AppError::InvalidCredentials);
        }

        claims.subject()
    }

    /// Validates a bearer access token for request guards.
    ///
    /// # Errors
    /// See [`Self::get_subject`].
    pub fn authenticate(&self, token: &str) -> Result<i64> {
        self.get_subject(token, TokenType::Access)
    }

    /// Hashes a password off the async runtime; argon2 is deliberately slow.
    ///
    /// # Errors
    /// `Internal` on hashing failure.
    pub async fn hash_password(&self, password: &str) -> Result<String> {
        let password = password.to_string();
        tokio::task::spawn_blocking(move || password::hash(&password))
            .await
            .map_err(|_| AppError::Internal)?
    }

    /// Verifies a password off the async runtime.
    ///
    /// # Errors
    /// `Internal` on an unparsable stored hash.
    pub async fn verify_password(&self, password: &str, password_hash: &str) -> Result<bool> {
        let password = password.to_string();
        let password_hash = password_hash.to_string();
        tokio::task::spawn_blocking(move || password::verify(&password, &password_hash))
            .await
            .map_err(|_| AppError::Internal)?
    }

    /// Mints an access/refresh pair and persists the refresh token record in
    /// the caller's transaction.
    #[tracing::instrument(err, skip(self, conn), fields(user_id = %user_id))]
    pub async fn create_session(&self, conn: &mut PgConnection, user_id: i64) -> Result<AuthSession> {
        let now = OffsetDateTime::now_utc();
        let access_ttl = Duration::minutes(self.config.access_token_ttl_mins);
        let refresh_expires_at = now + Duration::days(self.config.refresh_token_ttl_days);

        let access_token = self.sign(&Claims::new(user_id, TokenType::Access, now + access_ttl))?;
        let refresh_token = self.sign(&Claims::new(user_id, TokenType::Refresh, refresh_expires_at))?;

        self.refresh_repo.create(&mut *conn, &refresh_token, user_id, refresh_expires_at).await?;

        Ok(AuthSession {
            access_token,
            refresh_token,
            expires_in: access_ttl.whole_seconds(),
        })
    }

    /// Rotation protocol: verify the presented refresh token, consume its
    /// store record and issue a replacement pair, all in one transaction.
    /// Use-once semantics; a replayed token fails with `TokenReuseDetected`.
    #[tracing::instrument(err(level = "warn"), skip(self, pool, refresh_token), fields(user_id = tracing::field::Empty))]
    pub async fn refresh_session(&self, pool: &DbPool, refresh_token: String) -> Result<AuthSession> {
        let user_id = self.get_subject(&refresh_token, TokenType::Refresh)?;
        tracing::Span::current().record("user_id", tracing::field::display(user_id));

        let mut tx = pool.begin().await?;

        let record = self
            .refresh_repo
            .find_for_update(&mut tx, &refresh_token)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if record.revoked {
            self.metrics.token_reuse_total.add(1, &[]);
            return Err(AppError::TokenReuseDetected);
        }
        if record.is_expired() || record.user_id != user_id {
            return Err(AppError::InvalidCredentials);
        }

        // The row lock makes this guard decisive: a concurrent rotation
        // either blocked behind us or already flipped the flag.
        let consumed = self.refresh_repo.revoke(&mut tx, &refresh_token).await?;
        if consumed == 0 {
            self.metrics.token_reuse_total.add(1, &[]);
            return Err(AppError::TokenReuseDetected);
        }

        let session = self.create_session(&mut tx, user_id).await?;
        tx.commit().await?;

        tracing::info!("Tokens rotated successfully");
        self.metrics.refresh_total.add(1, &[]);

        Ok(session)
    }

    /// Revokes a refresh token owned by the user (logout). One-way; the
    /// record is retained for audit.
    #[tracing::instrument(err, skip(self, conn, refresh_token), fields(user_id = %user_id))]
    pub async fn revoke_session(&self, conn: &mut PgConnection, user_id: i64, refresh_token: String) -> Result<()> {
        self.refresh_repo.revoke_owned(&mut *conn, &refresh_token, user_id).await?;
        self.metrics.logout_total.add(1, &[]);
        Ok(())
    }

    fn sign(&self, claims: &Claims) -> Result<String> {
        encode(&self.header, claims, &self.encoding_key).map_err(|_| AppError::Internal)
    }
}
