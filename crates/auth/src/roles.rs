use core::str::FromStr;

use serde::{Deserialize, Serialize};

use attest_core::DomainError;

/// Role identifier used for RBAC.
///
/// The role set is closed: roles are labels on a `User`, never stored as
/// per-instance permission lists. The catalog maps each role to its
/// permission set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    Admin,
    Issuer,
    Verifier,
    Holder,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::SuperAdmin,
        Role::Admin,
        Role::Issuer,
        Role::Verifier,
        Role::Holder,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::Admin => "admin",
            Role::Issuer => "issuer",
            Role::Verifier => "verifier",
            Role::Holder => "holder",
        }
    }

    /// Roles that grant management capabilities over other accounts.
    pub fn is_management(&self) -> bool {
        matches!(self, Role::SuperAdmin | Role::Admin)
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "super_admin" => Ok(Role::SuperAdmin),
            "admin" => Ok(Role::Admin),
            "issuer" => Ok(Role::Issuer),
            "verifier" => Ok(Role::Verifier),
            "holder" => Ok(Role::Holder),
            other => Err(DomainError::validation(format!("unknown role '{other}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_str() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn unknown_role_is_rejected() {
        assert!("root".parse::<Role>().is_err());
    }
}
