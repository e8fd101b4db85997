//! Public, unauthenticated certificate verification.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, Method, Uri};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::app::dto::PublicCertificateSummary;
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::RequestMeta;

/// GET /verify/:token - anonymous certificate verification
pub async fn verify(
    State(services): State<Arc<AppServices>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let meta = RequestMeta::from_parts(&method, &uri, &headers);
    let (cert, report) = services.verify_public(&token, &meta)?;

    // Always 200; an unknown token reports `invalid` with no certificate.
    Ok(Json(json!({
        "success": true,
        "result": report.outcome.as_str(),
        "message": report.message,
        "certificate": cert.as_ref().map(PublicCertificateSummary::from),
    })))
}
