//! Request/response shapes for the HTTP surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use attest_auth::{Role, User};
use attest_certs::Certificate;
use attest_core::UserId;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    #[serde(default)]
    pub organization: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    #[serde(default)]
    pub organization: Option<String>,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct AssignRoleRequest {
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct CreateCertificateRequest {
    pub title: String,
    pub kind: String,
    pub holder_id: UserId,
    pub holder_name: String,
    pub issuing_organization: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Default)]
pub struct RevokeRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

/// User representation returned over the wire. Never carries the password
/// hash or lockout internals.
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub organization: Option<String>,
    pub role: Role,
    pub active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            organization: user.organization,
            role: user.role,
            active: user.active,
            last_login: user.last_login,
            created_at: user.created_at,
        }
    }
}

/// Redacted certificate summary for the public verification endpoint.
/// Never discloses the signature, checksum, or internal ids.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicCertificateSummary {
    pub certificate_id: String,
    pub serial_number: String,
    pub title: String,
    pub kind: String,
    pub holder_name: String,
    pub issuing_organization: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub status: String,
}

impl From<&Certificate> for PublicCertificateSummary {
    fn from(cert: &Certificate) -> Self {
        Self {
            certificate_id: cert.certificate_id.clone(),
            serial_number: cert.serial_number.clone(),
            title: cert.title.clone(),
            kind: cert.kind.clone(),
            holder_name: cert.holder_name.clone(),
            issuing_organization: cert.issuing_organization.clone(),
            issued_at: cert.issued_at,
            expires_at: cert.expires_at,
            status: cert.status.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attest_certs::NewCertificate;

    #[test]
    fn public_summary_redacts_integrity_fields() {
        let cert = Certificate::issue(
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
                expires_at: None,
            },
            Utc::now(),
        )
        .unwrap();

        let json = serde_json::to_value(PublicCertificateSummary::from(&cert)).unwrap();
        let body = json.to_string();
        assert!(!body.contains(&cert.checksum));
        assert!(!body.contains(&cert.verification_token));
        assert!(json.get("checksum").is_none());
        assert!(json.get("digitalSignature").is_none());
    }
}
