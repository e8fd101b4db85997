//! User entity: identity, role, activation and lockout lifecycle.
//!
//! All derived fields are computed by the `register` factory before the
//! entity is ever exposed, so no instance can exist partially initialized.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use attest_core::{DomainError, DomainResult, UserId};

use crate::lockout::LockoutState;
use crate::roles::Role;

/// Input for creating a user (self-registration or admin-create).
///
/// `password_hash` is already hashed; plain passwords never reach the
/// entity layer.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub organization: Option<String>,
    pub role: Role,
}

/// A user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    /// Unique, stored lowercase.
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub organization: Option<String>,
    pub role: Role,
    pub active: bool,
    #[serde(flatten)]
    pub lockout: LockoutState,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Factory: validate + normalize, producing a fully-initialized record.
    pub fn register(input: NewUser, now: DateTime<Utc>) -> DomainResult<Self> {
        let email = input.email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(DomainError::validation("invalid email format"));
        }

        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }

        Ok(Self {
            id: UserId::new(),
            email,
            password_hash: input.password_hash,
            name,
            organization: input.organization,
            role: input.role,
            active: true,
            lockout: LockoutState::default(),
            last_login: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.lockout.is_locked(now)
    }

    /// Apply a failed password check.
    pub fn record_failed_login(&mut self, now: DateTime<Utc>) {
        self.lockout = self.lockout.after_failure(now);
        self.updated_at = now;
    }

    /// Apply a successful login: counters reset, lock cleared, last_login
    /// stamped.
    pub fn record_successful_login(&mut self, now: DateTime<Utc>) {
        self.lockout = self.lockout.after_success();
        self.last_login = Some(now);
        self.updated_at = now;
    }

    /// Change the role. The privilege-escalation rule is enforced by the
    /// calling operation, not here.
    pub fn assign_role(&mut self, role: Role, now: DateTime<Utc>) {
        self.role = role;
        self.updated_at = now;
    }

    pub fn set_active(&mut self, active: bool, now: DateTime<Utc>) {
        self.active = active;
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            password_hash: "$hash".to_string(),
            name: "Test User".to_string(),
            organization: None,
            role: Role::Holder,
        }
    }

    #[test]
    fn register_normalizes_email() {
        let user = User::register(new_user("  Alice@Example.COM "), Utc::now()).unwrap();
        assert_eq!(user.email, "alice@example.com");
        assert!(user.active);
        assert_eq!(user.lockout.attempts, 0);
    }

    #[test]
    fn register_rejects_bad_email() {
        assert!(User::register(new_user("not-an-email"), Utc::now()).is_err());
        assert!(User::register(new_user("  "), Utc::now()).is_err());
    }

    #[test]
    fn register_rejects_empty_name() {
        let mut input = new_user("a@example.com");
        input.name = "   ".to_string();
        assert!(User::register(input, Utc::now()).is_err());
    }

    #[test]
    fn successful_login_stamps_last_login_and_resets_lockout() {
        let now = Utc::now();
        let mut user = User::register(new_user("a@example.com"), now).unwrap();

        user.record_failed_login(now);
        user.record_failed_login(now);
        assert_eq!(user.lockout.attempts, 2);

        user.record_successful_login(now);
        assert_eq!(user.lockout.attempts, 0);
        assert_eq!(user.last_login, Some(now));
    }
}
