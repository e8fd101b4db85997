//! Uniform error envelope: `{ success: false, error, code, ...extra }`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use thiserror::Error;

use attest_auth::{AuthzError, Role, TokenError};
use attest_certs::CertificateError;
use attest_core::DomainError;
use attest_store::StoreError;

/// API-level failure, mapped to a stable error code + HTTP status.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApiError {
    #[error("authentication required")]
    AuthRequired,

    #[error("access token has expired")]
    TokenExpired,

    #[error("invalid access token")]
    TokenInvalid,

    #[error("wrong token type")]
    TokenTypeInvalid,

    #[error("account is deactivated")]
    AccountInactive,

    #[error("account is temporarily locked")]
    AccountLocked { lock_until: DateTime<Utc> },

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("email already registered")]
    EmailTaken,

    #[error("permission denied")]
    PermissionDenied { required: String, role: Role },

    #[error("permission denied")]
    AnyPermissionDenied { required: Vec<String>, role: Role },

    #[error("role not allowed for this operation")]
    RoleDenied { role: Role },

    #[error("ownership required")]
    OwnershipRequired,

    #[error("insufficient privilege for this role assignment")]
    InsufficientPrivilege,

    #[error("certificate not found")]
    CertNotFound,

    #[error("certificate is already revoked")]
    AlreadyRevoked,

    #[error("certificate is not pending")]
    CertNotPending,

    #[error("cannot deactivate your own account")]
    SelfDeactivation,

    #[error("cannot delete your own account")]
    SelfDeletion,

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("internal server error")]
    Internal(String),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::AuthRequired => "AUTH_REQUIRED",
            ApiError::TokenExpired => "TOKEN_EXPIRED",
            ApiError::TokenInvalid => "TOKEN_INVALID",
            ApiError::TokenTypeInvalid => "TOKEN_TYPE_INVALID",
            ApiError::AccountInactive => "ACCOUNT_INACTIVE",
            ApiError::AccountLocked { .. } => "ACCOUNT_LOCKED",
            ApiError::InvalidCredentials => "INVALID_CREDENTIALS",
            ApiError::EmailTaken => "EMAIL_TAKEN",
            ApiError::PermissionDenied { .. } | ApiError::AnyPermissionDenied { .. } => {
                "PERMISSION_DENIED"
            }
            ApiError::RoleDenied { .. } => "ROLE_DENIED",
            ApiError::OwnershipRequired => "OWNERSHIP_REQUIRED",
            ApiError::InsufficientPrivilege => "INSUFFICIENT_PRIVILEGE",
            ApiError::CertNotFound => "CERT_NOT_FOUND",
            ApiError::AlreadyRevoked => "ALREADY_REVOKED",
            ApiError::CertNotPending => "CERT_NOT_PENDING",
            ApiError::SelfDeactivation => "SELF_DEACTIVATION",
            ApiError::SelfDeletion => "SELF_DELETION",
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::AuthRequired
            | ApiError::TokenExpired
            | ApiError::TokenInvalid
            | ApiError::TokenTypeInvalid
            | ApiError::AccountInactive
            | ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,

            ApiError::AccountLocked { .. } => StatusCode::LOCKED,

            ApiError::PermissionDenied { .. }
            | ApiError::AnyPermissionDenied { .. }
            | ApiError::RoleDenied { .. }
            | ApiError::OwnershipRequired
            | ApiError::InsufficientPrivilege => StatusCode::FORBIDDEN,

            ApiError::CertNotFound | ApiError::NotFound(_) => StatusCode::NOT_FOUND,

            ApiError::EmailTaken | ApiError::AlreadyRevoked | ApiError::CertNotPending => {
                StatusCode::CONFLICT
            }

            ApiError::SelfDeactivation | ApiError::SelfDeletion => StatusCode::BAD_REQUEST,

            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,

            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Extra envelope fields carried by some variants.
    fn extra(&self) -> Value {
        match self {
            ApiError::AccountLocked { lock_until } => {
                json!({ "lockUntil": lock_until.to_rfc3339() })
            }
            ApiError::PermissionDenied { required, role } => {
                json!({ "requiredPermission": required, "userRole": role.as_str() })
            }
            ApiError::AnyPermissionDenied { required, role } => {
                json!({ "requiredPermissions": required, "userRole": role.as_str() })
            }
            ApiError::RoleDenied { role } => json!({ "userRole": role.as_str() }),
            _ => json!({}),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Infrastructure detail is logged server-side, never leaked.
        let message = match &self {
            ApiError::Internal(detail) => {
                tracing::error!(detail = %detail, "internal error");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };

        let mut body = json!({
            "success": false,
            "error": message,
            "code": self.code(),
        });

        if let (Some(body_map), Some(extra)) = (body.as_object_mut(), self.extra().as_object()) {
            for (k, v) in extra {
                body_map.insert(k.clone(), v.clone());
            }
        }

        (self.status(), axum::Json(body)).into_response()
    }
}

impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::PermissionDenied { required, role } => {
                ApiError::PermissionDenied { required, role }
            }
            AuthzError::AnyPermissionDenied { required, role } => {
                ApiError::AnyPermissionDenied { required, role }
            }
            AuthzError::RoleDenied { role } => ApiError::RoleDenied { role },
            AuthzError::OwnershipRequired => ApiError::OwnershipRequired,
            AuthzError::InsufficientPrivilege { .. } => ApiError::InsufficientPrivilege,
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => ApiError::TokenExpired,
            TokenError::Invalid => ApiError::TokenInvalid,
            TokenError::WrongType => ApiError::TokenTypeInvalid,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::EmailTaken => ApiError::EmailTaken,
            StoreError::NotFound => ApiError::NotFound("record not found".to_string()),
            StoreError::Backend(detail) => ApiError::Internal(detail),
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => {
                ApiError::Validation(msg)
            }
        }
    }
}

impl From<CertificateError> for ApiError {
    fn from(err: CertificateError) -> Self {
        match err {
            CertificateError::AlreadyRevoked => ApiError::AlreadyRevoked,
            CertificateError::NotPending(_) => ApiError::CertNotPending,
            CertificateError::Domain(e) => e.into(),
        }
    }
}
