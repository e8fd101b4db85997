//! `attest-certs` — certificate integrity engine.
//!
//! Identifier generation, content checksum, HMAC digital signature, the
//! status state machine and public-verification outcome evaluation. All
//! derived fields are computed exactly once, at entity creation.

pub mod certificate;
pub mod integrity;
pub mod verify;

pub use certificate::{
    Certificate, CertificateError, CertificateStatus, NewCertificate, VerificationRecord,
};
pub use integrity::CertificateSigner;
pub use verify::{evaluate, VerificationOutcome, VerificationReport};
