//! Authentication routes.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde_json::json;

use crate::app::dto::{LoginRequest, RefreshRequest, RegisterRequest, UserView};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::{CurrentUser, RequestMeta};

/// POST /auth/register - self-registration (role is always holder)
pub async fn register(
    State(services): State<Arc<AppServices>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let meta = RequestMeta::from_parts(&method, &uri, &headers);
    let (user, tokens) = services.register(req, &meta)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "user": UserView::from(user),
            "tokens": tokens,
        })),
    ))
}

/// POST /auth/login - credential login with lockout enforcement
pub async fn login(
    State(services): State<Arc<AppServices>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let meta = RequestMeta::from_parts(&method, &uri, &headers);
    let (user, tokens) = services.login(req, &meta)?;

    Ok(Json(json!({
        "success": true,
        "user": UserView::from(user),
        "tokens": tokens,
    })))
}

/// POST /auth/refresh - exchange a refresh token for a new pair
pub async fn refresh(
    State(services): State<Arc<AppServices>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Json(req): Json<RefreshRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let meta = RequestMeta::from_parts(&method, &uri, &headers);
    let (user, tokens) = services.refresh(&req.refresh_token, &meta)?;

    Ok(Json(json!({
        "success": true,
        "user": UserView::from(user),
        "tokens": tokens,
    })))
}

/// GET /auth/me - the authenticated caller's live record
pub async fn me(
    State(services): State<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let user = services.current_user(&current)?;
    Ok(Json(json!({
        "success": true,
        "user": UserView::from(user),
    })))
}
