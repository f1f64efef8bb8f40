use crate::domain::session::RefreshToken;
use time::OffsetDateTime;

#[derive(sqlx::FromRow)]
pub(crate) struct RefreshTokenRecord {
    pub token: String,
    pub user_id: i64,
    pub expires_at: OffsetDateTime,
    pub revoked: bool,
    pub revoked_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

impl From<RefreshTokenRecord> for RefreshToken {
    fn from(record: RefreshTokenRecord) -> Self {
        Self {
            token: record.token,
            user_id: record.user_id,
            expires_at: record.expires_at,
            revoked: record.revoked,
            revoked_at: record.revoked_at,
            created_at: record.created_at,
        }
    }
}
