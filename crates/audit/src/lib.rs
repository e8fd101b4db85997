//! `attest-audit` — append-only audit trail.
//!
//! Every security-relevant action (including failures) produces exactly
//! one immutable entry. Recording is fire-and-forget relative to the
//! caller: a sink failure is logged and swallowed, never propagated, so
//! observability can never break the primary request path.

pub mod entry;
pub mod recorder;

pub use entry::{
    ActorSnapshot, AuditAction, AuditEntry, ChangeSnapshot, RequestInfo, Severity,
};
pub use recorder::{AuditRecorder, AuditSink, AuditSinkError, InMemoryAuditSink};
