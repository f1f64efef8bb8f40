//! Token lifecycle tests against the public service API. These run without a
//! database: issuance and validation are pure functions of the signing key.

use peerlend_server::config::AuthConfig;
use peerlend_server::domain::lockout::{self, LockoutCheck, MAX_FAILED_LOGINS};
use peerlend_server::domain::token::TokenType;
use peerlend_server::error::AppError;
use peerlend_server::services::auth_service::AuthService;
use peerlend_server::storage::refresh_token_repo::RefreshTokenRepository;
use time::{Duration, OffsetDateTime};

fn auth_service(secret: &str) -> AuthService {
    let config = AuthConfig {
        jwt_secret: secret.to_string(),
        jwt_algorithm: "HS256".to_string(),
        access_token_ttl_mins: 15,
        refresh_token_ttl_days: 30,
    };
    AuthService::new(config, RefreshTokenRepository::new()).expect("valid auth config")
}

#[test]
fn issued_access_token_carries_subject_and_type() {
    let service = auth_service("lifecycle_secret");

    let token = service.issue_access_token(1234, None).unwrap();
    let claims = service.decode_token(&token).unwrap();

    assert!(claims.verify_type(TokenType::Access));
    assert!(!claims.verify_type(TokenType::Refresh));
    assert_eq!(claims.subject().unwrap(), 1234);
}

#[test]
fn refresh_token_subject_roundtrip() {
    let service = auth_service("lifecycle_secret");

    let token = service.issue_refresh_token(42, None).unwrap();

    assert_eq!(service.get_subject(&token, TokenType::Refresh).unwrap(), 42);
}

#[test]
fn access_token_is_never_accepted_as_refresh() {
    let service = auth_service("lifecycle_secret");

    let access = service.issue_access_token(42, None).unwrap();

    assert!(matches!(
        service.get_subject(&access, TokenType::Refresh),
        Err(AppError::InvalidCredentials)
    ));
}

#[test]
fn expired_token_fails_even_with_valid_signature() {
    let service = auth_service("lifecycle_secret");

    let token = service.issue_access_token(7, Some(Duration::hours(-2))).unwrap();

    assert!(matches!(service.decode_token(&token), Err(AppError::InvalidCredentials)));
}

#[test]
fn foreign_signature_is_rejected() {
    let issuer = auth_service("secret_a");
    let verifier = auth_service("secret_b");

    let token = issuer.issue_access_token(7, None).unwrap();

    assert!(matches!(verifier.authenticate(&token), Err(AppError::InvalidCredentials)));
}

#[test]
fn tampered_token_is_rejected() {
    let service = auth_service("lifecycle_secret");

    let mut token = service.issue_access_token(7, None).unwrap();
    token.pop();
    token.push('A');

    assert!(matches!(service.decode_token(&token), Err(AppError::InvalidCredentials)));
}

#[test]
fn lockout_engages_on_the_fifth_failure_and_clears_after_the_window() {
    let now = OffsetDateTime::now_utc();
    let mut count = 0;
    let mut locked_until = None;

    for _ in 0..MAX_FAILED_LOGINS {
        assert_eq!(lockout::check(locked_until, now), LockoutCheck::Unlocked);
        let t = lockout::on_failed_attempt(count, locked_until, now);
        count = t.failed_login_count;
        locked_until = t.locked_until;
    }

    assert_eq!(count, MAX_FAILED_LOGINS);
    assert_eq!(locked_until, Some(now + Duration::minutes(30)));

    // A sixth attempt inside the window is refused outright.
    assert!(matches!(
        lockout::check(locked_until, now + Duration::minutes(1)),
        LockoutCheck::Locked { .. }
    ));

    // Past the window the account is attemptable again, and a failure
    // restarts the count rather than extending the lock.
    let later = now + Duration::minutes(31);
    assert_eq!(lockout::check(locked_until, later), LockoutCheck::Unlocked);
    let t = lockout::on_failed_attempt(count, locked_until, later);
    assert_eq!(t.failed_login_count, 1);
    assert_eq!(t.locked_until, None);
}
