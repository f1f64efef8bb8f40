//! Account lockout state machine.
//!
//! Pure transition functions over the credential row; the caller is
//! responsible for executing them inside the same transaction as the row
//! read so concurrent attempts serialize on the row lock.
//!
//! Ordering contract: the lock-window check runs before password
//! verification and before any counter change. The failure that reaches the
//! threshold still surfaces as invalid credentials; the lock takes effect
//! from the next attempt onward.

use time::{Duration, OffsetDateTime};

pub const MAX_FAILED_LOGINS: i32 = 5;
pub const LOCKOUT_WINDOW: Duration = Duration::minutes(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockoutCheck {
    Unlocked,
    Locked { retry_after_secs: i64 },
}

/// Evaluates the lock window. Must run before the password hash is consulted.
pub fn check(locked_until: Option<OffsetDateTime>, now: OffsetDateTime) -> LockoutCheck {
    match locked_until {
        Some(until) if now < until => LockoutCheck::Locked {
            retry_after_secs: (until - now).whole_seconds().max(1),
        },
        _ => LockoutCheck::Unlocked,
    }
}

/// New counter and lock values to persist after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureTransition {
    pub failed_login_count: i32,
    pub locked_until: Option<OffsetDateTime>,
}

/// Applies a failed login attempt to an unlocked (or expired-lock) record.
///
/// An expired window restarts the count at 1; it never auto-resets without
/// an attempt. The attempt that brings the count to the threshold sets
/// `locked_until = now + LOCKOUT_WINDOW`. The window is not re-extended
/// while locked, since locked attempts are rejected before reaching here.
pub fn on_failed_attempt(
    failed_login_count: i32,
    locked_until: Option<OffsetDateTime>,
    now: OffsetDateTime,
) -> FailureTransition {
    if locked_until.is_some_and(|until| now >= until) {
        return FailureTransition {
            failed_login_count: 1,
            locked_until: None,
        };
    }

    let count = failed_login_count + 1;
    FailureTransition {
        failed_login_count: count,
        locked_until: (count >= MAX_FAILED_LOGINS).then(|| now + LOCKOUT_WINDOW),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap()
    }

    #[test]
    fn test_failures_below_threshold_stay_unlocked() {
        let mut count = 0;
        let mut locked_until = None;

        for expected in 1..MAX_FAILED_LOGINS {
            let t = on_failed_attempt(count, locked_until, now());
            assert_eq!(t.failed_login_count, expected);
            assert_eq!(t.locked_until, None);
            count = t.failed_login_count;
            locked_until = t.locked_until;
        }
    }

    #[test]
    fn test_fifth_failure_locks_for_exactly_thirty_minutes() {
        let t = on_failed_attempt(4, None, now());

        assert_eq!(t.failed_login_count, 5);
        assert_eq!(t.locked_until, Some(now() + Duration::minutes(30)));
    }

    #[test]
    fn test_locked_window_rejects_attempts() {
        let locked_until = Some(now() + Duration::minutes(30));

        let LockoutCheck::Locked { retry_after_secs } = check(locked_until, now() + Duration::minutes(5)) else {
            panic!("expected locked");
        };
        assert_eq!(retry_after_secs, 25 * 60);
    }

    #[test]
    fn test_expired_window_is_unlocked() {
        let locked_until = Some(now());

        assert_eq!(check(locked_until, now()), LockoutCheck::Unlocked);
        assert_eq!(check(locked_until, now() + Duration::seconds(1)), LockoutCheck::Unlocked);
        assert_eq!(check(None, now()), LockoutCheck::Unlocked);
    }

    #[test]
    fn test_failure_after_expired_window_restarts_count() {
        let locked_until = Some(now() - Duration::minutes(1));

        let t = on_failed_attempt(5, locked_until, now());
        assert_eq!(t.failed_login_count, 1);
        assert_eq!(t.locked_until, None);
    }

    #[test]
    fn test_retry_after_never_reports_zero() {
        let locked_until = Some(now() + Duration::milliseconds(200));

        let LockoutCheck::Locked { retry_after_secs } = check(locked_until, now()) else {
            panic!("expected locked");
        };
        assert_eq!(retry_after_secs, 1);
    }
}
