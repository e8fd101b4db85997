//! User collection with a unique email index.

use std::collections::HashMap;
use std::sync::RwLock;

use attest_auth::User;
use attest_core::UserId;

use crate::error::StoreError;

/// User document collection.
pub trait UserStore: Send + Sync {
    /// Insert a new user; fails with [`StoreError::EmailTaken`] when the
    /// email is already indexed.
    fn insert(&self, user: User) -> Result<(), StoreError>;

    fn get(&self, id: UserId) -> Result<Option<User>, StoreError>;

    fn get_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Replace the stored document (last-writer-wins).
    fn update(&self, user: User) -> Result<(), StoreError>;

    /// Hard delete. Only the super-admin operation reaches this.
    fn delete(&self, id: UserId) -> Result<(), StoreError>;

    fn list(&self) -> Result<Vec<User>, StoreError>;
}

/// In-memory implementation.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    inner: RwLock<Collections>,
}

#[derive(Debug, Default)]
struct Collections {
    users: HashMap<UserId, User>,
    /// email (lowercase) → user id.
    email_index: HashMap<String, UserId>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserStore for InMemoryUserStore {
    fn insert(&self, user: User) -> Result<(), StoreError> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| StoreError::backend("lock poisoned"))?;

        if inner.email_index.contains_key(&user.email) {
            return Err(StoreError::EmailTaken);
        }

        inner.email_index.insert(user.email.clone(), user.id);
        inner.users.insert(user.id, user);
        Ok(())
    }

    fn get(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let inner = self
            .inner
            .read()
            .map_err(|_| StoreError::backend("lock poisoned"))?;
        Ok(inner.users.get(&id).cloned())
    }

    fn get_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let inner = self
            .inner
            .read()
            .map_err(|_| StoreError::backend("lock poisoned"))?;
        let id = inner.email_index.get(&email.to_lowercase());
        Ok(id.and_then(|id| inner.users.get(id)).cloned())
    }

    fn update(&self, user: User) -> Result<(), StoreError> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| StoreError::backend("lock poisoned"))?;

        let Some(existing) = inner.users.get(&user.id) else {
            return Err(StoreError::NotFound);
        };

        // Keep the unique index consistent if the email ever changes.
        if existing.email != user.email {
            if inner.email_index.contains_key(&user.email) {
                return Err(StoreError::EmailTaken);
            }
            let old_email = existing.email.clone();
            inner.email_index.remove(&old_email);
            inner.email_index.insert(user.email.clone(), user.id);
        }

        inner.users.insert(user.id, user);
        Ok(())
    }

    fn delete(&self, id: UserId) -> Result<(), StoreError> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| StoreError::backend("lock poisoned"))?;

        let Some(user) = inner.users.remove(&id) else {
            return Err(StoreError::NotFound);
        };
        inner.email_index.remove(&user.email);
        Ok(())
    }

    fn list(&self) -> Result<Vec<User>, StoreError> {
        let inner = self
            .inner
            .read()
            .map_err(|_| StoreError::backend("lock poisoned"))?;
        Ok(inner.users.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attest_auth::{NewUser, Role};
    use chrono::Utc;

    fn user(email: &str) -> User {
        User::register(
            NewUser {
                email: email.to_string(),
                password_hash: "$hash".to_string(),
                name: "Test".to_string(),
                organization: None,
                role: Role::Holder,
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn email_uniqueness_enforced() {
        let store = InMemoryUserStore::new();
        store.insert(user("a@example.com")).unwrap();

        let err = store.insert(user("a@example.com")).unwrap_err();
        assert_eq!(err, StoreError::EmailTaken);
    }

    #[test]
    fn lookup_by_email_is_case_insensitive() {
        let store = InMemoryUserStore::new();
        let u = user("alice@example.com");
        let id = u.id;
        store.insert(u).unwrap();

        let found = store.get_by_email("Alice@Example.COM").unwrap().unwrap();
        assert_eq!(found.id, id);
    }

    #[test]
    fn delete_frees_the_email() {
        let store = InMemoryUserStore::new();
        let u = user("a@example.com");
        let id = u.id;
        store.insert(u).unwrap();

        store.delete(id).unwrap();
        assert!(store.get(id).unwrap().is_none());
        store.insert(user("a@example.com")).unwrap();
    }

    #[test]
    fn update_missing_user_is_not_found() {
        let store = InMemoryUserStore::new();
        let err = store.update(user("a@example.com")).unwrap_err();
        assert_eq!(err, StoreError::NotFound);
    }
}
