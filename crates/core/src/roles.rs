//! Well-known viewer roles.
//!
//! Role names must match the values stored in `users.role` (see
//! `20260301000001_create_schools_and_users.sql`). Parsing also accepts the
//! hyphenated spelling used by older clients.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::scope::Scope;

pub const ROLE_SYSTEM_ADMIN: &str = "system_admin";
pub const ROLE_SCHOOL_OWNER: &str = "school_owner";
pub const ROLE_PRINCIPAL: &str = "principal";
pub const ROLE_TEACHER: &str = "teacher";
pub const ROLE_PARENT: &str = "parent";
pub const ROLE_FINANCE_OFFICER: &str = "finance_officer";

/// A known viewer role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SystemAdmin,
    SchoolOwner,
    Principal,
    Teacher,
    Parent,
    FinanceOfficer,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::SystemAdmin,
        Role::SchoolOwner,
        Role::Principal,
        Role::Teacher,
        Role::Parent,
        Role::FinanceOfficer,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::SystemAdmin => ROLE_SYSTEM_ADMIN,
            Role::SchoolOwner => ROLE_SCHOOL_OWNER,
            Role::Principal => ROLE_PRINCIPAL,
            Role::Teacher => ROLE_TEACHER,
            Role::Parent => ROLE_PARENT,
            Role::FinanceOfficer => ROLE_FINANCE_OFFICER,
        }
    }

    /// Every role except the system administrator is bound to one school.
    pub fn requires_school(self) -> bool {
        !matches!(self, Role::SystemAdmin)
    }

    /// The broadest scope a holder of this role may see.
    pub fn default_scope(self) -> Scope {
        match self {
            Role::SystemAdmin => Scope::System,
            Role::SchoolOwner | Role::Principal | Role::FinanceOfficer => Scope::School,
            Role::Teacher => Scope::Class,
            Role::Parent => Scope::Student,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a role string does not name a known role.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == normalized)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}
