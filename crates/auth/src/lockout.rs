//! Account lockout guard: failed-login counters + temporary lock windows.
//!
//! Pure state transitions so the caller persists one updated record per
//! attempt. Policy:
//! - 5 consecutive failures lock the account for 2 hours.
//! - An attempt while locked is rejected before any password comparison.
//! - The first attempt after the window expires resets the counter to 1
//!   (not 0): the probe that unlocks counts as a real attempt.
//! - A successful login resets the counter to 0 and clears the lock.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Failures that trigger a lock.
pub const MAX_FAILED_ATTEMPTS: u32 = 5;
/// Lock window length.
pub const LOCK_WINDOW_HOURS: i64 = 2;

/// Per-account lockout state (embedded in the user record).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LockoutState {
    pub attempts: u32,
    pub lock_until: Option<DateTime<Utc>>,
}

impl LockoutState {
    /// True iff a lock window is currently in force.
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        matches!(self.lock_until, Some(until) if until > now)
    }

    /// Transition after a failed password check.
    ///
    /// Must not be called while `is_locked` — locked attempts are rejected
    /// before the password is ever compared.
    pub fn after_failure(self, now: DateTime<Utc>) -> Self {
        // An expired lock means this failure is the unlocking probe: it
        // clears the lock and counts as attempt number one.
        if self.lock_until.is_some_and(|until| until <= now) {
            return Self {
                attempts: 1,
                lock_until: None,
            };
        }

        let attempts = self.attempts + 1;
        let lock_until = if attempts >= MAX_FAILED_ATTEMPTS {
            Some(now + Duration::hours(LOCK_WINDOW_HOURS))
        } else {
            None
        };

        Self {
            attempts,
            lock_until,
        }
    }

    /// Transition after a successful login: unconditional reset.
    pub fn after_success(self) -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn five_failures_lock_for_the_configured_window() {
        let now = Utc::now();
        let mut state = LockoutState::default();

        for i in 1..MAX_FAILED_ATTEMPTS {
            state = state.after_failure(now);
            assert_eq!(state.attempts, i);
            assert!(!state.is_locked(now), "locked too early at attempt {i}");
        }

        state = state.after_failure(now);
        assert_eq!(state.attempts, MAX_FAILED_ATTEMPTS);
        assert_eq!(state.lock_until, Some(now + Duration::hours(LOCK_WINDOW_HOURS)));
        assert!(state.is_locked(now));
        assert!(state.is_locked(now + Duration::hours(LOCK_WINDOW_HOURS) - Duration::seconds(1)));
    }

    #[test]
    fn lock_expires_at_window_boundary() {
        let now = Utc::now();
        let state = LockoutState {
            attempts: MAX_FAILED_ATTEMPTS,
            lock_until: Some(now),
        };
        // `lock_until > now` is the locked condition; the boundary is open.
        assert!(!state.is_locked(now));
    }

    #[test]
    fn failed_probe_after_window_counts_as_one() {
        let now = Utc::now();
        let locked = LockoutState {
            attempts: MAX_FAILED_ATTEMPTS,
            lock_until: Some(now - Duration::minutes(1)),
        };

        let state = locked.after_failure(now);
        assert_eq!(state.attempts, 1);
        assert_eq!(state.lock_until, None);
    }

    #[test]
    fn success_resets_unconditionally() {
        let now = Utc::now();
        let locked = LockoutState {
            attempts: MAX_FAILED_ATTEMPTS,
            lock_until: Some(now - Duration::minutes(1)),
        };

        let state = locked.after_success();
        assert_eq!(state.attempts, 0);
        assert_eq!(state.lock_until, None);
        assert!(!state.is_locked(now));
    }
}
