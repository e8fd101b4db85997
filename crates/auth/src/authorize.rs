//! Authorization engine: pure checks over the static permission catalog.
//!
//! - No IO
//! - No panics
//! - Unknown roles/permissions evaluate to a denial, never an error

use serde::Serialize;
use thiserror::Error;

use crate::catalog::PermissionCatalog;
use crate::roles::Role;

/// Authorization denial.
///
/// Variants are deliberately distinct so the API layer can map them to
/// their own stable error codes (and so audit entries can carry the
/// attempted permission and actual role).
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize)]
pub enum AuthzError {
    #[error("permission denied: '{required}' (role: {role})")]
    PermissionDenied { required: String, role: Role },

    #[error("permission denied: none of the required permissions held (role: {role})")]
    AnyPermissionDenied { required: Vec<String>, role: Role },

    #[error("role not allowed: {role}")]
    RoleDenied { role: Role },

    #[error("ownership required")]
    OwnershipRequired,

    #[error("insufficient privilege to assign role '{target}'")]
    InsufficientPrivilege { target: Role },
}

/// True iff `role` holds `permission` (or the wildcard sentinel).
pub fn has_permission(catalog: &PermissionCatalog, role: Role, permission: &str) -> bool {
    catalog.grants(role, permission)
}

/// Any-of semantics over a permission set.
pub fn has_any_permission(catalog: &PermissionCatalog, role: Role, permissions: &[&str]) -> bool {
    permissions.iter().any(|p| catalog.grants(role, p))
}

/// Role-exact check (no catalog involved).
pub fn has_role(role: Role, allowed: &[Role]) -> bool {
    allowed.contains(&role)
}

/// Check a single permission, yielding a denial carrying the attempted
/// permission and actual role.
pub fn authorize(
    catalog: &PermissionCatalog,
    role: Role,
    permission: &str,
) -> Result<(), AuthzError> {
    if has_permission(catalog, role, permission) {
        Ok(())
    } else {
        Err(AuthzError::PermissionDenied {
            required: permission.to_string(),
            role,
        })
    }
}

/// Any-of check over a permission set.
pub fn authorize_any(
    catalog: &PermissionCatalog,
    role: Role,
    permissions: &[&str],
) -> Result<(), AuthzError> {
    if has_any_permission(catalog, role, permissions) {
        Ok(())
    } else {
        Err(AuthzError::AnyPermissionDenied {
            required: permissions.iter().map(|p| p.to_string()).collect(),
            role,
        })
    }
}

/// Owner-or-permission check for `:own`-scoped reads: passes when the
/// role holds the unscoped permission outright, or when the actor owns
/// the target resource.
pub fn authorize_owner_or(
    catalog: &PermissionCatalog,
    role: Role,
    permission: &str,
    is_owner: bool,
) -> Result<(), AuthzError> {
    if is_owner || has_permission(catalog, role, permission) {
        Ok(())
    } else {
        Err(AuthzError::OwnershipRequired)
    }
}

/// Role-exact check, used for the super-admin-only delete operation.
pub fn authorize_role(role: Role, allowed: &[Role]) -> Result<(), AuthzError> {
    if has_role(role, allowed) {
        Ok(())
    } else {
        Err(AuthzError::RoleDenied { role })
    }
}

/// Privilege-escalation rule (cross-cutting, enforced by the calling
/// operation rather than the permission check): assigning or creating a
/// user with a management role requires the actor to be exactly
/// `super_admin`.
pub fn ensure_can_grant(actor: Role, target: Role) -> Result<(), AuthzError> {
    if target.is_management() && actor != Role::SuperAdmin {
        return Err(AuthzError::InsufficientPrivilege { target });
    }
    Ok(())
}
