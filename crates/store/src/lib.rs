//! `attest-store` — document-store boundary.
//!
//! Traits model a generic document store with query/update/bulk-update
//! capabilities; the in-memory implementations back tests and dev. Single-
//! entity read-modify-write is last-writer-wins (accepted for this
//! workload); the expiry sweep is one atomic conditional bulk mutation.

pub mod certificates;
pub mod error;
pub mod users;

pub use certificates::{CertificateStore, InMemoryCertificateStore};
pub use error::StoreError;
pub use users::{InMemoryUserStore, UserStore};
