use axum::http::{HeaderMap, Method, Uri};

use attest_audit::RequestInfo;
use attest_auth::Role;
use attest_core::UserId;

/// Authenticated caller for a request.
///
/// The role is the token's issuance-time snapshot; a server-side role
/// change takes effect when the access token expires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: String,
    pub role: Role,
}

impl CurrentUser {
    pub fn new(id: UserId, email: String, role: Role) -> Self {
        Self { id, email, role }
    }
}

/// Request metadata captured for audit entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestMeta {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub method: String,
    pub path: String,
}

impl RequestMeta {
    pub fn from_parts(method: &Method, uri: &Uri, headers: &HeaderMap) -> Self {
        let ip = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(',').next().unwrap_or(v).trim().to_string());

        let user_agent = headers
            .get(axum::http::header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());

        Self {
            ip,
            user_agent,
            method: method.to_string(),
            path: uri.path().to_string(),
        }
    }

    pub fn to_request_info(&self) -> RequestInfo {
        RequestInfo {
            ip: self.ip.clone(),
            user_agent: self.user_agent.clone(),
            method: Some(self.method.clone()),
            path: Some(self.path.clone()),
        }
    }
}
