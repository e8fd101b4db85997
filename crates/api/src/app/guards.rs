//! Authorization guards used at the top of protected handlers.
//!
//! Thin wrappers over the pure checks in `attest-auth` that record a
//! `security.forbidden` audit entry on every denial.

use attest_auth::{authorize, authorize_any, authorize_role, Role};

use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::{CurrentUser, RequestMeta};

pub fn require_permission(
    services: &AppServices,
    current: &CurrentUser,
    meta: &RequestMeta,
    permission: &str,
) -> Result<(), ApiError> {
    if let Err(err) = authorize(&services.catalog, current.role, permission) {
        services.audit_forbidden(current, meta, &format!("required: {permission}"));
        return Err(err.into());
    }
    Ok(())
}

pub fn require_any_permission(
    services: &AppServices,
    current: &CurrentUser,
    meta: &RequestMeta,
    permissions: &[&str],
) -> Result<(), ApiError> {
    if let Err(err) = authorize_any(&services.catalog, current.role, permissions) {
        services.audit_forbidden(current, meta, &format!("required any of: {permissions:?}"));
        return Err(err.into());
    }
    Ok(())
}

pub fn require_role(
    services: &AppServices,
    current: &CurrentUser,
    meta: &RequestMeta,
    allowed: &[Role],
) -> Result<(), ApiError> {
    if let Err(err) = authorize_role(current.role, allowed) {
        services.audit_forbidden(current, meta, "role not allowed");
        return Err(err.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::services::AppConfig;
    use attest_audit::AuditAction;
    use attest_auth::perm;
    use attest_core::UserId;

    fn services() -> std::sync::Arc<AppServices> {
        AppServices::new(&AppConfig {
            access_secret: "a".to_string(),
            refresh_secret: "r".to_string(),
            signing_secret: "s".to_string(),
            bootstrap_admin_email: "root@example.com".to_string(),
            bootstrap_admin_password: "bootstrap-pw".to_string(),
        })
        .unwrap()
    }

    fn holder() -> CurrentUser {
        CurrentUser::new(UserId::new(), "h@example.com".to_string(), Role::Holder)
    }

    #[test]
    fn denial_records_a_forbidden_entry() {
        let services = services();
        let meta = RequestMeta::default();

        let err =
            require_permission(&services, &holder(), &meta, perm::CERT_REVOKE).unwrap_err();
        assert_eq!(err.code(), "PERMISSION_DENIED");

        let forbidden = services
            .audit_sink
            .snapshot()
            .into_iter()
            .filter(|e| e.action == AuditAction::Forbidden)
            .count();
        assert_eq!(forbidden, 1);
    }

    #[test]
    fn grant_records_nothing() {
        let services = services();
        let meta = RequestMeta::default();

        require_permission(&services, &holder(), &meta, perm::CERT_VERIFY).unwrap();
        assert!(services
            .audit_sink
            .snapshot()
            .iter()
            .all(|e| e.action != AuditAction::Forbidden));
    }

    #[test]
    fn role_guard_is_exact() {
        let services = services();
        let meta = RequestMeta::default();
        let admin = CurrentUser::new(UserId::new(), "a@example.com".to_string(), Role::Admin);

        let err = require_role(&services, &admin, &meta, &[Role::SuperAdmin]).unwrap_err();
        assert_eq!(err.code(), "ROLE_DENIED");
    }
}
