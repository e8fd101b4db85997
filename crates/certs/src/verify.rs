//! Public verification outcome evaluation.
//!
//! The precedence order is policy, not an accident: a revoked certificate
//! reports `revoked` even when it is also past its expiry date.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::certificate::{Certificate, CertificateStatus};
use crate::integrity::CertificateSigner;

/// Result of a public verification lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationOutcome {
    Valid,
    Revoked,
    Expired,
    Suspended,
    Invalid,
}

impl VerificationOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationOutcome::Valid => "valid",
            VerificationOutcome::Revoked => "revoked",
            VerificationOutcome::Expired => "expired",
            VerificationOutcome::Suspended => "suspended",
            VerificationOutcome::Invalid => "invalid",
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, VerificationOutcome::Valid)
    }
}

/// Outcome plus its human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
    pub outcome: VerificationOutcome,
    pub message: String,
}

/// Evaluate a certificate in strict precedence order:
/// revoked > suspended > past expiry date > any other non-active status >
/// signature validity. The first matching condition wins.
pub fn evaluate(
    cert: &Certificate,
    signer: &CertificateSigner,
    now: DateTime<Utc>,
) -> VerificationReport {
    if cert.status == CertificateStatus::Revoked {
        let reason = cert
            .revocation_reason
            .as_deref()
            .unwrap_or("no reason recorded");
        return VerificationReport {
            outcome: VerificationOutcome::Revoked,
            message: format!("This certificate has been revoked: {reason}"),
        };
    }

    if cert.status == CertificateStatus::Suspended {
        return VerificationReport {
            outcome: VerificationOutcome::Suspended,
            message: "This certificate is suspended".to_string(),
        };
    }

    if cert.expires_at.is_some_and(|expires| expires < now) {
        return VerificationReport {
            outcome: VerificationOutcome::Expired,
            message: "This certificate has expired".to_string(),
        };
    }

    if cert.status != CertificateStatus::Active {
        return VerificationReport {
            outcome: VerificationOutcome::Invalid,
            message: format!("This certificate is not active (status: {})", cert.status),
        };
    }

    if cert.verify_signature(signer) {
        VerificationReport {
            outcome: VerificationOutcome::Valid,
            message: "Certificate is valid".to_string(),
        }
    } else {
        // Wrong secret and post-signing mutation are indistinguishable
        // here; only "invalid" is reported.
        VerificationReport {
            outcome: VerificationOutcome::Invalid,
            message: "Certificate integrity check failed".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::certificate::NewCertificate;
    use attest_core::UserId;
    use chrono::Duration;

    fn signer() -> CertificateSigner {
        CertificateSigner::new(b"verify-secret".to_vec())
    }

    fn active_cert(now: DateTime<Utc>, expires_at: Option<DateTime<Utc>>) -> Certificate {
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
        cert.sign(&signer(), now).unwrap();
        cert
    }

    #[test]
    fn valid_certificate_reports_valid() {
        let now = Utc::now();
        let cert = active_cert(now, None);
        let report = evaluate(&cert, &signer(), now);
        assert_eq!(report.outcome, VerificationOutcome::Valid);
    }

    #[test]
    fn revoked_wins_over_expired() {
        let now = Utc::now();
        let mut cert = active_cert(now, Some(now + Duration::days(1)));
        cert.revoke(UserId::new(), Some("policy violation".to_string()), now)
            .unwrap();

        // Both revoked and past expiry: revoked must win.
        let later = now + Duration::days(2);
        let report = evaluate(&cert, &signer(), later);
        assert_eq!(report.outcome, VerificationOutcome::Revoked);
        assert!(report.message.contains("policy violation"));
    }

    #[test]
    fn past_expiry_reports_expired() {
        let now = Utc::now();
        let cert = active_cert(now, Some(now + Duration::days(1)));
        let report = evaluate(&cert, &signer(), now + Duration::days(2));
        assert_eq!(report.outcome, VerificationOutcome::Expired);
    }

    #[test]
    fn pending_reports_invalid() {
        let now = Utc::now();
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
            now,
        )
        .unwrap();

        let report = evaluate(&cert, &signer(), now);
        assert_eq!(report.outcome, VerificationOutcome::Invalid);
    }

    #[test]
    fn tampered_content_reports_invalid() {
        let now = Utc::now();
        let mut cert = active_cert(now, None);
        cert.title = "Forged Title".to_string();

        let report = evaluate(&cert, &signer(), now);
        assert_eq!(report.outcome, VerificationOutcome::Invalid);
    }

    #[test]
    fn wrong_secret_reports_invalid_without_cause() {
        let now = Utc::now();
        let cert = active_cert(now, None);
        let other = CertificateSigner::new(b"other".to_vec());

        let report = evaluate(&cert, &other, now);
        assert_eq!(report.outcome, VerificationOutcome::Invalid);
        // Cause is deliberately not disclosed.
        assert!(!report.message.contains("secret"));
    }
}
