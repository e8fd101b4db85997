//! `attest-auth` — pure authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: the
//! permission catalog, authorization checks, token issuance/verification,
//! lockout transitions and the `User` entity are all plain data + pure
//! functions the API layer composes.

pub mod authorize;
pub mod catalog;
pub mod lockout;
pub mod password;
pub mod permissions;
pub mod roles;
pub mod tokens;
pub mod user;

pub use authorize::{
    authorize, authorize_any, authorize_owner_or, authorize_role, ensure_can_grant,
    has_any_permission, has_permission, has_role, AuthzError,
};
pub use catalog::PermissionCatalog;
pub use lockout::{LockoutState, LOCK_WINDOW_HOURS, MAX_FAILED_ATTEMPTS};
pub use password::{Argon2PasswordHasher, PasswordError, PasswordHasher};
pub use permissions::{perm, Permission};
pub use roles::Role;
pub use tokens::{AccessClaims, TokenConfig, TokenError, TokenPair, TokenService, TokenType};
pub use user::{NewUser, User};
