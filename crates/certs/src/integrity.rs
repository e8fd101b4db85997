//! Identifier generation, checksum and HMAC signing.
//!
//! Identifiers and checksum are assigned exactly once at first creation and
//! never recomputed afterwards; a checksum that no longer matches the
//! signed value is the tamper signal, not something to repair.

use chrono::{DateTime, Datelike, Utc};
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::Serialize;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use attest_core::UserId;

type HmacSha256 = Hmac<Sha256>;

/// Human-readable certificate id: `CERT-{year}-{8 hex}`.
pub fn generate_certificate_id(now: DateTime<Utc>) -> String {
    format!("CERT-{}-{}", now.year(), random_hex(4).to_uppercase())
}

/// Serial number: 16 hex chars.
pub fn generate_serial_number() -> String {
    random_hex(8).to_uppercase()
}

/// Public verification token: 64 hex chars (256 bits of CSPRNG output).
///
/// Its unguessability is the sole access control for the unauthenticated
/// verification endpoint.
pub fn generate_verification_token() -> String {
    random_hex(32)
}

fn random_hex(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    OsRng.fill_bytes(&mut buf);
    hex::encode(buf)
}

/// Canonical subset of fields covered by the content checksum.
///
/// Field order is fixed by this struct; `serde_json` serializes struct
/// fields in declaration order, which makes the JSON canonical.
#[derive(Debug, Serialize)]
struct ChecksumFields<'a> {
    title: &'a str,
    holder_id: UserId,
    holder_name: &'a str,
    issuing_organization: &'a str,
    issued_at: DateTime<Utc>,
    kind: &'a str,
}

/// SHA-256 over the canonical JSON of the checksum field subset (64 hex).
pub fn compute_checksum(
    title: &str,
    holder_id: UserId,
    holder_name: &str,
    issuing_organization: &str,
    issued_at: DateTime<Utc>,
    kind: &str,
) -> String {
    let fields = ChecksumFields {
        title,
        holder_id,
        holder_name,
        issuing_organization,
        issued_at,
        kind,
    };

    // Serialization of a struct with only string/id/timestamp fields
    // cannot fail; fall back to an empty document rather than panicking.
    let canonical = serde_json::to_vec(&fields).unwrap_or_default();
    hex::encode(Sha256::digest(&canonical))
}

/// HMAC-SHA256 signer over `certificateId|serialNumber|checksum`.
///
/// Verification re-derives the expected MAC from current field values and
/// compares in constant time. A mismatch means either a different signing
/// secret or post-signing mutation; the two causes are indistinguishable
/// and are reported only as "invalid".
#[derive(Clone)]
pub struct CertificateSigner {
    secret: Vec<u8>,
}

impl CertificateSigner {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    pub fn sign(&self, certificate_id: &str, serial_number: &str, checksum: &str) -> String {
        // HMAC accepts keys of any length, so this cannot fail.
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC can take key of any size");
        mac.update(signing_message(certificate_id, serial_number, checksum).as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    pub fn verify(
        &self,
        certificate_id: &str,
        serial_number: &str,
        checksum: &str,
        signature: &str,
    ) -> bool {
        let expected = self.sign(certificate_id, serial_number, checksum);
        expected.as_bytes().ct_eq(signature.as_bytes()).into()
    }
}

fn signing_message(certificate_id: &str, serial_number: &str, checksum: &str) -> String {
    format!("{certificate_id}|{serial_number}|{checksum}")
}
