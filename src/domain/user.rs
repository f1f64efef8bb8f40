use time::OffsetDateTime;

/// Credential record for a marketplace account. `id` is stable and immutable
/// once created; `password_hash` is replaced wholesale on change, never
/// diffed. A `failed_login_count` reaching the lockout threshold implies
/// `locked_until` was set at that instant.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub failed_login_count: i32,
    pub locked_until: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}
