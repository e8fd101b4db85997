//! User administration routes.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde_json::json;

use attest_auth::{authorize_owner_or, has_permission, perm, Role};
use attest_core::UserId;

use crate::app::dto::{AssignRoleRequest, CreateUserRequest, UserView};
use crate::app::errors::ApiError;
use crate::app::guards::{require_permission, require_role};
use crate::app::services::AppServices;
use crate::context::{CurrentUser, RequestMeta};

/// GET /users - list all accounts
pub async fn list(
    State(services): State<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Extension(meta): Extension<RequestMeta>,
) -> Result<impl IntoResponse, ApiError> {
    require_permission(&services, &current, &meta, perm::USER_READ)?;

    let users: Vec<UserView> = services
        .list_users()?
        .into_iter()
        .map(UserView::from)
        .collect();
    Ok(Json(json!({ "success": true, "users": users })))
}

/// POST /users - admin-create with a chosen role
pub async fn create(
    State(services): State<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Extension(meta): Extension<RequestMeta>,
    Json(req): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_permission(&services, &current, &meta, perm::USER_CREATE)?;

    let user = services.create_user(&current, req, &meta)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "user": UserView::from(user) })),
    ))
}

/// GET /users/:id - fetch one account
pub async fn get(
    State(services): State<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Extension(meta): Extension<RequestMeta>,
    Path(id): Path<UserId>,
) -> Result<impl IntoResponse, ApiError> {
    // Unscoped readers see anyone; `:own`-scoped readers only themselves.
    if !has_permission(&services.catalog, current.role, perm::USER_READ) {
        require_permission(&services, &current, &meta, perm::USER_READ_OWN)?;
        if let Err(err) =
            authorize_owner_or(&services.catalog, current.role, perm::USER_READ, id == current.id)
        {
            services.audit_forbidden(&current, &meta, "user read: not the subject");
            return Err(err.into());
        }
    }

    let user = services.get_user(id)?;
    Ok(Json(json!({ "success": true, "user": UserView::from(user) })))
}

/// POST /users/:id/role - change an account's role
pub async fn assign_role(
    State(services): State<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Extension(meta): Extension<RequestMeta>,
    Path(id): Path<UserId>,
    Json(req): Json<AssignRoleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_permission(&services, &current, &meta, perm::USER_ASSIGN_ROLE)?;

    let user = services.assign_role(&current, id, req.role, &meta)?;
    Ok(Json(json!({ "success": true, "user": UserView::from(user) })))
}

/// POST /users/:id/activate - re-enable an account
pub async fn activate(
    State(services): State<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Extension(meta): Extension<RequestMeta>,
    Path(id): Path<UserId>,
) -> Result<impl IntoResponse, ApiError> {
    require_permission(&services, &current, &meta, perm::USER_ACTIVATE)?;

    let user = services.set_user_active(&current, id, true, &meta)?;
    Ok(Json(json!({ "success": true, "user": UserView::from(user) })))
}

/// POST /users/:id/deactivate - disable an account
pub async fn deactivate(
    State(services): State<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Extension(meta): Extension<RequestMeta>,
    Path(id): Path<UserId>,
) -> Result<impl IntoResponse, ApiError> {
    require_permission(&services, &current, &meta, perm::USER_ACTIVATE)?;

    let user = services.set_user_active(&current, id, false, &meta)?;
    Ok(Json(json!({ "success": true, "user": UserView::from(user) })))
}

/// DELETE /users/:id - hard delete (super_admin only)
pub async fn delete(
    State(services): State<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Extension(meta): Extension<RequestMeta>,
    Path(id): Path<UserId>,
) -> Result<impl IntoResponse, ApiError> {
    // Hard delete is role-exact, not permission-based.
    require_role(&services, &current, &meta, &[Role::SuperAdmin])?;

    services.delete_user(&current, id, &meta)?;
    Ok(Json(json!({ "success": true })))
}
