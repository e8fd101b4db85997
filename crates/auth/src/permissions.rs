use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission identifier.
///
/// Permissions are modeled as opaque strings of the form
/// `resource:action[:scope]` (e.g. "certificate:read:own"). A special
/// wildcard permission `"*"` indicates "allow all" and is granted only to
/// the super-admin role by the catalog.
///
/// The `:own` scope is an **independent** grant: `certificate:read` and
/// `certificate:read:own` imply nothing about each other. Row-level
/// ownership for `:own` grants is re-checked by the calling operation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == perm::ALL
    }

    /// True for `:own`-scoped grants.
    pub fn is_own_scoped(&self) -> bool {
        self.as_str().ends_with(":own")
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Permission string constants.
///
/// Kept as `&'static str` so call sites can pass them without allocating;
/// `Permission::new(perm::…)` wraps them for typed sets.
pub mod perm {
    /// Wildcard sentinel satisfying every permission check.
    pub const ALL: &str = "*";

    pub const CERT_CREATE: &str = "certificate:create";
    pub const CERT_READ: &str = "certificate:read";
    pub const CERT_READ_OWN: &str = "certificate:read:own";
    pub const CERT_UPDATE: &str = "certificate:update";
    pub const CERT_SIGN: &str = "certificate:sign";
    pub const CERT_REVOKE: &str = "certificate:revoke";
    pub const CERT_VERIFY: &str = "certificate:verify";
    pub const CERT_EXPORT: &str = "certificate:export";

    pub const USER_CREATE: &str = "user:create";
    pub const USER_READ: &str = "user:read";
    pub const USER_READ_OWN: &str = "user:read:own";
    pub const USER_UPDATE: &str = "user:update";
    pub const USER_UPDATE_OWN: &str = "user:update:own";
    pub const USER_DELETE: &str = "user:delete";
    pub const USER_ASSIGN_ROLE: &str = "user:assign_role";
    pub const USER_ACTIVATE: &str = "user:activate";

    pub const AUDIT_READ: &str = "audit:read";
}
