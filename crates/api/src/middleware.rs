//! Bearer-token authentication middleware.
//!
//! Verifies the access token, loads the live user record (so deactivation
//! takes effect immediately), and injects [`CurrentUser`] + [`RequestMeta`]
//! extensions for the handlers. Every rejection records a
//! `security.unauthorized` audit entry before responding.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::{CurrentUser, RequestMeta};

pub async fn authenticate(
    State(services): State<Arc<AppServices>>,
    mut request: Request,
    next: Next,
) -> Response {
    let meta = RequestMeta::from_parts(request.method(), request.uri(), request.headers());

    match identify(&services, request.headers()) {
        Ok(current) => {
            request.extensions_mut().insert(current);
            request.extensions_mut().insert(meta);
            next.run(request).await
        }
        Err(err) => {
            services.audit_unauthorized(&meta, err.code());
            err.into_response()
        }
    }
}

fn identify(services: &AppServices, headers: &HeaderMap) -> Result<CurrentUser, ApiError> {
    let token = bearer_token(headers).ok_or(ApiError::AuthRequired)?;
    let claims = services.tokens.verify_access(token)?;

    // The token is a snapshot; existence and activation are checked live.
    let user = services
        .users
        .get(claims.sub)?
        .ok_or(ApiError::TokenInvalid)?;
    if !user.active {
        return Err(ApiError::AccountInactive);
    }

    Ok(CurrentUser::new(claims.sub, claims.email, claims.role))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_none());

        headers.insert(
            axum::http::header::AUTHORIZATION,
            "Bearer abc.def.ghi".parse().unwrap(),
        );
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));

        headers.insert(axum::http::header::AUTHORIZATION, "Basic xyz".parse().unwrap());
        assert!(bearer_token(&headers).is_none());

        headers.insert(axum::http::header::AUTHORIZATION, "Bearer ".parse().unwrap());
        assert!(bearer_token(&headers).is_none());
    }
}
