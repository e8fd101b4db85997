//! `attest-api` — HTTP surface for the certificate service.

pub mod app;
pub mod context;
pub mod middleware;
