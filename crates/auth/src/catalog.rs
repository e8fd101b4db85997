//! Static role → permission-set catalog.
//!
//! The catalog is an immutable configuration value constructed once at
//! process start and shared by reference into the authorization engine.
//! There is deliberately no mutation API.

use std::collections::{BTreeMap, BTreeSet};

use crate::permissions::{perm, Permission};
use crate::roles::Role;

/// Immutable mapping of each role to its ordered permission set.
#[derive(Debug, Clone)]
pub struct PermissionCatalog {
    map: BTreeMap<Role, BTreeSet<Permission>>,
}

impl PermissionCatalog {
    /// Build the built-in catalog.
    ///
    /// `super_admin` holds the wildcard sentinel only; every other role
    /// enumerates its grants explicitly.
    pub fn builtin() -> Self {
        let mut map = BTreeMap::new();

        map.insert(Role::SuperAdmin, to_set(&[perm::ALL]));

        map.insert(
            Role::Admin,
            to_set(&[
                perm::CERT_CREATE,
                perm::CERT_READ,
                perm::CERT_UPDATE,
                perm::CERT_SIGN,
                perm::CERT_REVOKE,
                perm::CERT_VERIFY,
                perm::CERT_EXPORT,
                perm::USER_CREATE,
                perm::USER_READ,
                perm::USER_UPDATE,
                perm::USER_ASSIGN_ROLE,
                perm::USER_ACTIVATE,
                perm::AUDIT_READ,
            ]),
        );

        map.insert(
            Role::Issuer,
            to_set(&[
                perm::CERT_CREATE,
                perm::CERT_READ,
                perm::CERT_SIGN,
                perm::CERT_REVOKE,
                perm::CERT_VERIFY,
                perm::CERT_EXPORT,
                perm::USER_READ_OWN,
                perm::USER_UPDATE_OWN,
            ]),
        );

        map.insert(
            Role::Verifier,
            to_set(&[
                perm::CERT_READ,
                perm::CERT_VERIFY,
                perm::USER_READ_OWN,
                perm::USER_UPDATE_OWN,
            ]),
        );

        map.insert(
            Role::Holder,
            to_set(&[
                perm::CERT_READ_OWN,
                perm::CERT_VERIFY,
                perm::USER_READ_OWN,
                perm::USER_UPDATE_OWN,
            ]),
        );

        Self { map }
    }

    /// Ordered permission set for a role. Every role is present in the
    /// builtin catalog; an absent role yields the empty set.
    pub fn permissions_for(&self, role: Role) -> &BTreeSet<Permission> {
        self.map.get(&role).unwrap_or_else(|| empty_set())
    }

    /// True iff the role's set contains the permission or the wildcard.
    pub fn grants(&self, role: Role, permission: &str) -> bool {
        let set = match self.map.get(&role) {
            Some(set) => set,
            None => return false,
        };
        set.iter()
            .any(|p| p.is_wildcard() || p.as_str() == permission)
    }
}

fn to_set(perms: &[&'static str]) -> BTreeSet<Permission> {
    perms.iter().map(|p| Permission::new(*p)).collect()
}

fn empty_set() -> &'static BTreeSet<Permission> {
    static EMPTY: std::sync::OnceLock<BTreeSet<Permission>> = std::sync::OnceLock::new();
    EMPTY.get_or_init(BTreeSet::new)
}
