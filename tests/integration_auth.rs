//! Database-backed tests for the credential and session lifecycle: refresh
//! rotation with use-once semantics, concurrent rotation races, and the
//! failed-login lockout walk.

mod common;

use common::TestContext;
use peerlend_server::error::AppError;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

const PASSWORD: &str = "correct horse battery";

fn unique_email(prefix: &str) -> String {
    format!("{prefix}_{}@example.com", Uuid::new_v4().simple())
}

async fn credential_state(
    pool: &peerlend_server::storage::DbPool,
    email: &str,
) -> (i32, Option<OffsetDateTime>) {
    sqlx::query_as("SELECT failed_login_count, locked_until FROM users WHERE email = $1")
        .bind(email)
        .fetch_one(pool)
        .await
        .expect("user row")
}

#[tokio::test]
async fn refresh_rotates_and_the_old_token_is_use_once() {
    let ctx = TestContext::spawn().await;

    let session = ctx
        .account
        .register(unique_email("rotate"), PASSWORD.to_string())
        .await
        .unwrap();

    let rotated = ctx.account.refresh(session.refresh_token.clone()).await.unwrap();
    assert_ne!(rotated.refresh_token, session.refresh_token);
    assert!(rotated.expires_in > 0);
    ctx.auth.authenticate(&rotated.access_token).unwrap();

    // Replaying the consumed token is flagged as reuse, not a generic 401.
    let replay = ctx.account.refresh(session.refresh_token).await;
    assert!(matches!(replay, Err(AppError::TokenReuseDetected)));

    // The replacement token is unaffected by the replay attempt.
    ctx.account.refresh(rotated.refresh_token).await.unwrap();
}

#[tokio::test]
async fn concurrent_refresh_of_one_token_has_a_single_winner() {
    let ctx = TestContext::spawn().await;

    let session = ctx
        .account
        .register(unique_email("race"), PASSWORD.to_string())
        .await
        .unwrap();

    let (a, b) = tokio::join!(
        ctx.account.refresh(session.refresh_token.clone()),
        ctx.account.refresh(session.refresh_token.clone()),
    );

    let winners = usize::from(a.is_ok()) + usize::from(b.is_ok());
    assert_eq!(winners, 1, "exactly one rotation may succeed");

    let loser = if a.is_ok() { b } else { a };
    assert!(matches!(
        loser,
        Err(AppError::TokenReuseDetected | AppError::InvalidCredentials)
    ));
}

#[tokio::test]
async fn refresh_rejects_unknown_and_mistyped_tokens() {
    let ctx = TestContext::spawn().await;

    let session = ctx
        .account
        .register(unique_email("mistype"), PASSWORD.to_string())
        .await
        .unwrap();

    // An access token never passes the refresh gate, even though it is
    // validly signed.
    let mistyped = ctx.account.refresh(session.access_token).await;
    assert!(matches!(mistyped, Err(AppError::InvalidCredentials)));

    // A well-formed refresh token with no store record is refused too.
    let unstored = ctx.auth.issue_refresh_token(999_999, None).unwrap();
    let unknown = ctx.account.refresh(unstored).await;
    assert!(matches!(unknown, Err(AppError::InvalidCredentials)));
}

#[tokio::test]
async fn fifth_failure_locks_the_account_for_thirty_minutes() {
    let ctx = TestContext::spawn().await;
    let email = unique_email("lockout");
    ctx.account.register(email.clone(), PASSWORD.to_string()).await.unwrap();

    for attempt in 1..=4 {
        let res = ctx.account.login(email.clone(), "wrong password".to_string()).await;
        assert!(matches!(res, Err(AppError::InvalidCredentials)), "attempt {attempt}");
    }
    let (count, locked_until) = credential_state(&ctx.pool, &email).await;
    assert_eq!(count, 4);
    assert!(locked_until.is_none());

    // The threshold failure engages the lock but still answers as a plain
    // credential failure.
    let before = OffsetDateTime::now_utc();
    let res = ctx.account.login(email.clone(), "wrong password".to_string()).await;
    assert!(matches!(res, Err(AppError::InvalidCredentials)));

    let (count, locked_until) = credential_state(&ctx.pool, &email).await;
    assert_eq!(count, 5);
    let locked_until = locked_until.expect("lock engaged on the fifth failure");
    assert!(locked_until >= before + Duration::minutes(30));
    assert!(locked_until <= OffsetDateTime::now_utc() + Duration::minutes(30));

    // While locked even the correct password is refused, and the stored
    // state is untouched.
    match ctx.account.login(email.clone(), PASSWORD.to_string()).await {
        Err(AppError::AccountLocked { retry_after_secs }) => {
            assert!(retry_after_secs > 0);
            assert!(retry_after_secs <= 30 * 60);
        }
        other => panic!("expected AccountLocked, got {other:?}"),
    }
    let (count_after, locked_after) = credential_state(&ctx.pool, &email).await;
    assert_eq!(count_after, 5);
    assert_eq!(locked_after, Some(locked_until));
}

#[tokio::test]
async fn successful_login_clears_the_failure_counter() {
    let ctx = TestContext::spawn().await;
    let email = unique_email("reset");
    ctx.account.register(email.clone(), PASSWORD.to_string()).await.unwrap();

    for _ in 0..2 {
        let res = ctx.account.login(email.clone(), "wrong password".to_string()).await;
        assert!(matches!(res, Err(AppError::InvalidCredentials)));
    }
    let (count, _) = credential_state(&ctx.pool, &email).await;
    assert_eq!(count, 2);

    let session = ctx.account.login(email.clone(), PASSWORD.to_string()).await.unwrap();
    ctx.auth.authenticate(&session.access_token).unwrap();

    let (count, locked_until) = credential_state(&ctx.pool, &email).await;
    assert_eq!(count, 0);
    assert!(locked_until.is_none());
}

#[tokio::test]
async fn unknown_email_fails_like_a_wrong_password() {
    let ctx = TestContext::spawn().await;

    let res = ctx
        .account
        .login(unique_email("ghost"), PASSWORD.to_string())
        .await;

    assert!(matches!(res, Err(AppError::InvalidCredentials)));
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let ctx = TestContext::spawn().await;
    let email = unique_email("dup");

    ctx.account.register(email.clone(), PASSWORD.to_string()).await.unwrap();
    let res = ctx.account.register(email, PASSWORD.to_string()).await;

    assert!(matches!(res, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn logout_revokes_the_refresh_token() {
    let ctx = TestContext::spawn().await;

    let session = ctx
        .account
        .register(unique_email("logout"), PASSWORD.to_string())
        .await
        .unwrap();
    let user_id = ctx.auth.authenticate(&session.access_token).unwrap();

    ctx.account.logout(user_id, session.refresh_token.clone()).await.unwrap();

    let res = ctx.account.refresh(session.refresh_token).await;
    assert!(matches!(res, Err(AppError::TokenReuseDetected)));
}
