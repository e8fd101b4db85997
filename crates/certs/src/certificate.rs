//! Certificate entity and its status state machine.
//!
//! Lifecycle: `draft → pending → active → {expired, revoked, suspended}`.
//! Creation always starts at `pending`; promotion to `active` computes the
//! digital signature. `draft` and `suspended` exist as values with no
//! inbound transition (reserved for future workflows).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use attest_core::{CertId, DomainError, DomainResult, UserId};

use crate::integrity::{
    compute_checksum, generate_certificate_id, generate_serial_number,
    generate_verification_token, CertificateSigner,
};

/// Default revocation reason when the caller supplies none.
pub const DEFAULT_REVOCATION_REASON: &str = "No reason provided";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CertificateStatus {
    Draft,
    Pending,
    Active,
    Expired,
    Revoked,
    Suspended,
}

impl core::fmt::Display for CertificateStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            CertificateStatus::Draft => "draft",
            CertificateStatus::Pending => "pending",
            CertificateStatus::Active => "active",
            CertificateStatus::Expired => "expired",
            CertificateStatus::Revoked => "revoked",
            CertificateStatus::Suspended => "suspended",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CertificateError {
    /// Idempotency guard: revoking twice is an error, never a silent no-op.
    #[error("certificate is already revoked")]
    AlreadyRevoked,

    #[error("certificate is not pending (status: {0})")]
    NotPending(CertificateStatus),

    #[error("{0}")]
    Domain(#[from] DomainError),
}

/// One public verification attempt, appended to the certificate's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationRecord {
    /// Authenticated verifier, if any (public lookups are anonymous).
    pub verifier: Option<UserId>,
    pub at: DateTime<Utc>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub result: String,
}

/// Input for issuing a certificate.
#[derive(Debug, Clone)]
pub struct NewCertificate {
    pub title: String,
    pub kind: String,
    pub holder_id: UserId,
    pub holder_name: String,
    pub issuer_id: UserId,
    pub issuing_organization: String,
    pub skills: Vec<String>,
    pub grade: Option<String>,
    pub score: Option<f64>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// A certificate record.
///
/// Invariants:
/// - `certificate_id`, `serial_number`, `verification_token` and `checksum`
///   are assigned exactly once by [`Certificate::issue`] and never
///   reassigned.
/// - `digital_signature` is present iff the status ever reached `active`.
/// - `verification_history` is append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Certificate {
    pub id: CertId,
    pub certificate_id: String,
    pub serial_number: String,
    /// Unguessable bearer key for anonymous verification lookups.
    pub verification_token: String,
    pub status: CertificateStatus,

    pub title: String,
    pub kind: String,
    pub holder_id: UserId,
    pub holder_name: String,
    pub issuer_id: UserId,
    pub issuing_organization: String,
    pub skills: Vec<String>,
    pub grade: Option<String>,
    pub score: Option<f64>,

    pub issued_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub revoked_by: Option<UserId>,
    pub revocation_reason: Option<String>,

    pub checksum: String,
    pub digital_signature: Option<String>,
    pub verification_history: Vec<VerificationRecord>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Certificate {
    /// Factory: validate input and compute every derived field (ids,
    /// token, checksum) before the entity exists. Status starts at
    /// `pending`; signing is a separate, explicit step.
    pub fn issue(input: NewCertificate, now: DateTime<Utc>) -> DomainResult<Self> {
        let title = input.title.trim().to_string();
        if title.is_empty() {
            return Err(DomainError::validation("title cannot be empty"));
        }

        let holder_name = input.holder_name.trim().to_string();
        if holder_name.is_empty() {
            return Err(DomainError::validation("holder name cannot be empty"));
        }

        if let Some(expires_at) = input.expires_at {
            if expires_at <= now {
                return Err(DomainError::validation("expiry must be in the future"));
            }
        }

        let checksum = compute_checksum(
            &title,
            input.holder_id,
            &holder_name,
            &input.issuing_organization,
            now,
            &input.kind,
        );

        Ok(Self {
            id: CertId::new(),
            certificate_id: generate_certificate_id(now),
            serial_number: generate_serial_number(),
            verification_token: generate_verification_token(),
            status: CertificateStatus::Pending,
            title,
            kind: input.kind,
            holder_id: input.holder_id,
            holder_name,
            issuer_id: input.issuer_id,
            issuing_organization: input.issuing_organization,
            skills: input.skills,
            grade: input.grade,
            score: input.score,
            issued_at: now,
            expires_at: input.expires_at,
            revoked_at: None,
            revoked_by: None,
            revocation_reason: None,
            checksum,
            digital_signature: None,
            verification_history: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Promote `pending → active`, computing the digital signature.
    ///
    /// Taken automatically at creation when the creator can sign, and by
    /// the explicit sign operation for certificates left pending.
    pub fn sign(
        &mut self,
        signer: &CertificateSigner,
        now: DateTime<Utc>,
    ) -> Result<(), CertificateError> {
        if self.status != CertificateStatus::Pending {
            return Err(CertificateError::NotPending(self.status));
        }

        self.digital_signature =
            Some(signer.sign(&self.certificate_id, &self.serial_number, &self.checksum));
        self.status = CertificateStatus::Active;
        self.updated_at = now;
        Ok(())
    }

    /// Revoke. Guarded against double revocation; the reason defaults when
    /// none is supplied.
    pub fn revoke(
        &mut self,
        revoked_by: UserId,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), CertificateError> {
        if self.status == CertificateStatus::Revoked {
            return Err(CertificateError::AlreadyRevoked);
        }

        self.status = CertificateStatus::Revoked;
        self.revoked_at = Some(now);
        self.revoked_by = Some(revoked_by);
        self.revocation_reason =
            Some(reason.unwrap_or_else(|| DEFAULT_REVOCATION_REASON.to_string()));
        self.updated_at = now;
        Ok(())
    }

    /// Derived expiry view: stored-`active` but past its expiry date.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.status == CertificateStatus::Active
            && self.expires_at.is_some_and(|expires| expires < now)
    }

    /// Currently presentable: active and not past expiry.
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.status == CertificateStatus::Active && !self.is_expired(now)
    }

    /// Re-derive the expected signature from current field values and
    /// compare (constant time).
    ///
    /// The checksum is recomputed from the content fields here, never read
    /// back from storage, so editing a signed field after signing fails
    /// verification even when the stored checksum was edited to match.
    pub fn verify_signature(&self, signer: &CertificateSigner) -> bool {
        let Some(sig) = &self.digital_signature else {
            return false;
        };

        let expected_checksum = compute_checksum(
            &self.title,
            self.holder_id,
            &self.holder_name,
            &self.issuing_organization,
            self.issued_at,
            &self.kind,
        );
        if expected_checksum != self.checksum {
            return false;
        }

        signer.verify(
            &self.certificate_id,
            &self.serial_number,
            &expected_checksum,
            sig,
        )
    }

    /// Append a verification attempt to the history (append-only).
    pub fn record_verification(&mut self, record: VerificationRecord) {
        self.verification_history.push(record);
    }
}
