//! Audit entry model.
//!
//! Entries are facts: created once, never mutated or deleted by the
//! application. Retention is an operational concern outside this crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use attest_core::AuditEntryId;

/// Stable action tags for security-relevant events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    LoginSucceeded,
    LoginFailed,
    Registered,
    TokenRefreshed,
    Unauthorized,
    Forbidden,
    UserCreated,
    RoleAssigned,
    UserActivated,
    UserDeactivated,
    UserDeleted,
    CertificateCreated,
    CertificateSigned,
    CertificateRevoked,
    CertificateExpireSweep,
    CertificateVerified,
    CertificateVerifyFailed,
    CertificateExported,
}

impl AuditAction {
    /// Dotted event tag (e.g. "security.unauthorized").
    pub fn tag(&self) -> &'static str {
        match self {
            AuditAction::LoginSucceeded => "auth.login",
            AuditAction::LoginFailed => "auth.login_failed",
            AuditAction::Registered => "auth.register",
            AuditAction::TokenRefreshed => "auth.token_refresh",
            AuditAction::Unauthorized => "security.unauthorized",
            AuditAction::Forbidden => "security.forbidden",
            AuditAction::UserCreated => "user.created",
            AuditAction::RoleAssigned => "user.role_assigned",
            AuditAction::UserActivated => "user.activated",
            AuditAction::UserDeactivated => "user.deactivated",
            AuditAction::UserDeleted => "user.deleted",
            AuditAction::CertificateCreated => "certificate.created",
            AuditAction::CertificateSigned => "certificate.signed",
            AuditAction::CertificateRevoked => "certificate.revoked",
            AuditAction::CertificateExpireSweep => "certificate.expire_sweep",
            AuditAction::CertificateVerified => "certificate.verified",
            AuditAction::CertificateVerifyFailed => "certificate.verify_failed",
            AuditAction::CertificateExported => "certificate.exported",
        }
    }

    /// Severity policy: routine operations are info; privilege changes and
    /// deactivation are warning; deletion and revocation are critical;
    /// denied access is warning.
    pub fn default_severity(&self) -> Severity {
        match self {
            AuditAction::Unauthorized
            | AuditAction::Forbidden
            | AuditAction::LoginFailed
            | AuditAction::RoleAssigned
            | AuditAction::UserDeactivated
            | AuditAction::CertificateVerifyFailed => Severity::Warning,

            AuditAction::UserDeleted | AuditAction::CertificateRevoked => Severity::Critical,

            _ => Severity::Info,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
    Error,
}

/// Actor identity at the time of the action — a snapshot, not a live
/// reference; a later role change does not rewrite history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorSnapshot {
    pub id: String,
    pub email: String,
    pub role: String,
}

/// Request metadata captured with the entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestInfo {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub method: Option<String>,
    pub path: Option<String>,
}

/// Before/after snapshot for privileged mutations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSnapshot {
    pub before: serde_json::Value,
    pub after: serde_json::Value,
}

/// An immutable audit log record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: AuditEntryId,
    pub action: AuditAction,
    pub severity: Severity,
    pub actor: Option<ActorSnapshot>,
    pub target_kind: Option<String>,
    pub target_id: Option<String>,
    pub success: bool,
    pub request: RequestInfo,
    pub details: Option<String>,
    pub change: Option<ChangeSnapshot>,
    pub at: DateTime<Utc>,
}

impl AuditEntry {
    /// New entry with the action's default severity.
    pub fn new(action: AuditAction, success: bool, at: DateTime<Utc>) -> Self {
        Self {
            id: AuditEntryId::new(),
            action,
            severity: action.default_severity(),
            actor: None,
            target_kind: None,
            target_id: None,
            success,
            request: RequestInfo::default(),
            details: None,
            change: None,
            at,
        }
    }

    pub fn with_actor(mut self, id: impl Into<String>, email: impl Into<String>, role: impl Into<String>) -> Self {
        self.actor = Some(ActorSnapshot {
            id: id.into(),
            email: email.into(),
            role: role.into(),
        });
        self
    }

    pub fn with_target(mut self, kind: impl Into<String>, id: impl Into<String>) -> Self {
        self.target_kind = Some(kind.into());
        self.target_id = Some(id.into());
        self
    }

    pub fn with_request(mut self, request: RequestInfo) -> Self {
        self.request = request;
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_change(mut self, before: serde_json::Value, after: serde_json::Value) -> Self {
        self.change = Some(ChangeSnapshot { before, after });
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_policy() {
        assert_eq!(AuditAction::LoginSucceeded.default_severity(), Severity::Info);
        assert_eq!(AuditAction::CertificateCreated.default_severity(), Severity::Info);
        assert_eq!(AuditAction::Unauthorized.default_severity(), Severity::Warning);
        assert_eq!(AuditAction::Forbidden.default_severity(), Severity::Warning);
        assert_eq!(AuditAction::RoleAssigned.default_severity(), Severity::Warning);
        assert_eq!(AuditAction::UserDeactivated.default_severity(), Severity::Warning);
        assert_eq!(AuditAction::UserDeleted.default_severity(), Severity::Critical);
        assert_eq!(AuditAction::CertificateRevoked.default_severity(), Severity::Critical);
    }

    #[test]
    fn builder_populates_snapshot() {
        let entry = AuditEntry::new(AuditAction::RoleAssigned, true, Utc::now())
            .with_actor("u1", "admin@example.com", "super_admin")
            .with_target("user", "u2")
            .with_details("role: holder -> issuer");

        let actor = entry.actor.unwrap();
        assert_eq!(actor.role, "super_admin");
        assert_eq!(entry.target_id.as_deref(), Some("u2"));
        assert_eq!(entry.severity, Severity::Warning);
    }
}
