//! Certificate lifecycle routes.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde_json::json;

use attest_auth::perm;
use attest_core::CertId;

use crate::app::dto::{CreateCertificateRequest, RevokeRequest};
use crate::app::errors::ApiError;
use crate::app::guards::{require_any_permission, require_permission};
use crate::app::services::AppServices;
use crate::context::{CurrentUser, RequestMeta};

/// POST /certificates - issue a certificate
pub async fn create(
    State(services): State<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Extension(meta): Extension<RequestMeta>,
    Json(req): Json<CreateCertificateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_permission(&services, &current, &meta, perm::CERT_CREATE)?;

    let cert = services.create_certificate(&current, req, &meta)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "certificate": cert })),
    ))
}

/// GET /certificates - all certificates, or own for scoped readers
pub async fn list(
    State(services): State<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Extension(meta): Extension<RequestMeta>,
) -> Result<impl IntoResponse, ApiError> {
    require_any_permission(
        &services,
        &current,
        &meta,
        &[perm::CERT_READ, perm::CERT_READ_OWN],
    )?;

    let certs = services.list_certificates(&current)?;
    Ok(Json(json!({ "success": true, "certificates": certs })))
}

/// GET /certificates/:id - fetch one certificate
pub async fn get(
    State(services): State<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Extension(meta): Extension<RequestMeta>,
    Path(id): Path<CertId>,
) -> Result<impl IntoResponse, ApiError> {
    require_any_permission(
        &services,
        &current,
        &meta,
        &[perm::CERT_READ, perm::CERT_READ_OWN],
    )?;

    let cert = services.get_certificate(&current, id, &meta)?;
    Ok(Json(json!({ "success": true, "certificate": cert })))
}

/// POST /certificates/:id/sign - promote pending to active
pub async fn sign(
    State(services): State<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Extension(meta): Extension<RequestMeta>,
    Path(id): Path<CertId>,
) -> Result<impl IntoResponse, ApiError> {
    require_permission(&services, &current, &meta, perm::CERT_SIGN)?;

    let cert = services.sign_certificate(&current, id, &meta)?;
    Ok(Json(json!({ "success": true, "certificate": cert })))
}

/// POST /certificates/:id/revoke - revoke with an optional reason
pub async fn revoke(
    State(services): State<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Extension(meta): Extension<RequestMeta>,
    Path(id): Path<CertId>,
    Json(req): Json<RevokeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_permission(&services, &current, &meta, perm::CERT_REVOKE)?;

    let cert = services.revoke_certificate(&current, id, req.reason, &meta)?;
    Ok(Json(json!({ "success": true, "certificate": cert })))
}

/// GET /certificates/:id/export - portable record + verify URL
pub async fn export(
    State(services): State<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Extension(meta): Extension<RequestMeta>,
    Path(id): Path<CertId>,
) -> Result<impl IntoResponse, ApiError> {
    // Holder-or-permission gate lives in the service.
    let cert = services.export_certificate(&current, id, &meta)?;
    let verify_url = format!("/verify/{}", cert.verification_token);

    Ok(Json(json!({
        "success": true,
        "certificate": cert,
        "verifyUrl": verify_url,
    })))
}

/// POST /certificates/expire-sweep - bulk-expire past-date actives
pub async fn expire_sweep(
    State(services): State<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Extension(meta): Extension<RequestMeta>,
) -> Result<impl IntoResponse, ApiError> {
    require_permission(&services, &current, &meta, perm::CERT_UPDATE)?;

    let expired = services.expire_sweep(&current, &meta)?;
    Ok(Json(json!({ "success": true, "expired": expired })))
}
