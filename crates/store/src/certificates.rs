//! Certificate collection with token lookup and the expiry sweep.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use attest_certs::{Certificate, CertificateStatus};
use attest_core::{CertId, UserId};

use crate::error::StoreError;

/// Certificate document collection.
pub trait CertificateStore: Send + Sync {
    fn insert(&self, cert: Certificate) -> Result<(), StoreError>;

    fn get(&self, id: CertId) -> Result<Option<Certificate>, StoreError>;

    /// Public lookup path: the token is the only key unauthenticated
    /// callers can use.
    fn find_by_verification_token(&self, token: &str) -> Result<Option<Certificate>, StoreError>;

    /// Replace the stored document (last-writer-wins).
    fn update(&self, cert: Certificate) -> Result<(), StoreError>;

    fn list(&self) -> Result<Vec<Certificate>, StoreError>;

    fn list_by_holder(&self, holder_id: UserId) -> Result<Vec<Certificate>, StoreError>;

    /// Atomic conditional bulk update: every `active` certificate with
    /// `expires_at < now` becomes `expired`, in one mutation, so two
    /// concurrent sweeps cannot double-process rows. Returns the number of
    /// certificates flipped.
    fn expire_sweep(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;
}

/// In-memory implementation.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryCertificateStore {
    certs: RwLock<HashMap<CertId, Certificate>>,
}

impl InMemoryCertificateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CertificateStore for InMemoryCertificateStore {
    fn insert(&self, cert: Certificate) -> Result<(), StoreError> {
        let mut certs = self
            .certs
            .write()
            .map_err(|_| StoreError::backend("lock poisoned"))?;
        certs.insert(cert.id, cert);
        Ok(())
    }

    fn get(&self, id: CertId) -> Result<Option<Certificate>, StoreError> {
        let certs = self
            .certs
            .read()
            .map_err(|_| StoreError::backend("lock poisoned"))?;
        Ok(certs.get(&id).cloned())
    }

    fn find_by_verification_token(&self, token: &str) -> Result<Option<Certificate>, StoreError> {
        let certs = self
            .certs
            .read()
            .map_err(|_| StoreError::backend("lock poisoned"))?;
        Ok(certs
            .values()
            .find(|c| c.verification_token == token)
            .cloned())
    }

    fn update(&self, cert: Certificate) -> Result<(), StoreError> {
        let mut certs = self
            .certs
            .write()
            .map_err(|_| StoreError::backend("lock poisoned"))?;

        if !certs.contains_key(&cert.id) {
            return Err(StoreError::NotFound);
        }
        certs.insert(cert.id, cert);
        Ok(())
    }

    fn list(&self) -> Result<Vec<Certificate>, StoreError> {
        let certs = self
            .certs
            .read()
            .map_err(|_| StoreError::backend("lock poisoned"))?;
        Ok(certs.values().cloned().collect())
    }

    fn list_by_holder(&self, holder_id: UserId) -> Result<Vec<Certificate>, StoreError> {
        let certs = self
            .certs
            .read()
            .map_err(|_| StoreError::backend("lock poisoned"))?;
        Ok(certs
            .values()
            .filter(|c| c.holder_id == holder_id)
            .cloned()
            .collect())
    }

    fn expire_sweep(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        // Single write lock for the whole sweep: the match + set is one
        // atomic mutation, never read-then-write-per-row.
        let mut certs = self
            .certs
            .write()
            .map_err(|_| StoreError::backend("lock poisoned"))?;

        let mut flipped = 0u64;
        for cert in certs.values_mut() {
            if cert.status == CertificateStatus::Active
                && cert.expires_at.is_some_and(|expires| expires < now)
            {
                cert.status = CertificateStatus::Expired;
                cert.updated_at = now;
                flipped += 1;
            }
        }

        Ok(flipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attest_certs::{CertificateSigner, NewCertificate};
    use chrono::Duration;

    fn cert(expires_at: Option<DateTime<Utc>>, signed: bool) -> Certificate {
        let now = Utc::now();
        let mut cert = Certificate::issue(
            NewCertificate {
                title: "Cert".to_string(),
                kind: "course".to_string(),
                holder_id: UserId::new(),
                holder_name: "Alice".to_string(),
                issuer_id: UserId::new(),
                issuing_organization: "Acme".to_string(),
                skills: vec![],
                grade: None,
                score: None,
                expires_at,
            },
            now,
        )
        .unwrap();
        if signed {
            cert.sign(&CertificateSigner::new(b"s".to_vec()), now).unwrap();
        }
        cert
    }

    #[test]
    fn token_lookup_finds_the_certificate() {
        let store = InMemoryCertificateStore::new();
        let c = cert(None, true);
        let token = c.verification_token.clone();
        let id = c.id;
        store.insert(c).unwrap();

        let found = store.find_by_verification_token(&token).unwrap().unwrap();
        assert_eq!(found.id, id);
        assert!(store.find_by_verification_token("unknown").unwrap().is_none());
    }

    #[test]
    fn expire_sweep_flips_only_qualifying_rows() {
        let store = InMemoryCertificateStore::new();
        let now = Utc::now();

        // Past-expiry active: flips.
        let mut past = cert(Some(now + Duration::seconds(1)), true);
        past.expires_at = Some(now - Duration::days(1));
        let past_id = past.id;
        store.insert(past).unwrap();

        // Future-expiry active: stays.
        let future = cert(Some(now + Duration::days(30)), true);
        let future_id = future.id;
        store.insert(future).unwrap();

        // Past-expiry but pending (never signed): stays.
        let mut pending = cert(Some(now + Duration::seconds(1)), false);
        pending.expires_at = Some(now - Duration::days(1));
        let pending_id = pending.id;
        store.insert(pending).unwrap();

        let flipped = store.expire_sweep(now).unwrap();
        assert_eq!(flipped, 1);

        assert_eq!(
            store.get(past_id).unwrap().unwrap().status,
            CertificateStatus::Expired
        );
        assert_eq!(
            store.get(future_id).unwrap().unwrap().status,
            CertificateStatus::Active
        );
        assert_eq!(
            store.get(pending_id).unwrap().unwrap().status,
            CertificateStatus::Pending
        );

        // A second sweep finds nothing left to flip.
        assert_eq!(store.expire_sweep(now).unwrap(), 0);
    }

    #[test]
    fn list_by_holder_filters() {
        let store = InMemoryCertificateStore::new();
        let c = cert(None, true);
        let holder = c.holder_id;
        store.insert(c).unwrap();
        store.insert(cert(None, true)).unwrap();

        assert_eq!(store.list_by_holder(holder).unwrap().len(), 1);
    }
}
