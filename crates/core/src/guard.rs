//! Scope guard.
//!
//! Evaluated on every request; decisions are never cached, so a viewer whose
//! scope changes between requests is re-checked against the new scope.

use serde::Serialize;

use crate::scope::Scope;

/// Why a guard refused access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuardDenial {
    pub required: Scope,
    pub actual: Scope,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Deny(GuardDenial),
}

impl GuardDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GuardDecision::Allow)
    }

    /// Convert into a `Result` so callers can use `?`.
    pub fn into_result(self) -> Result<(), GuardDenial> {
        match self {
            GuardDecision::Allow => Ok(()),
            GuardDecision::Deny(denial) => Err(denial),
        }
    }
}

/// Allow iff `actual >= required` under `system > school > class > student`.
pub fn guard(required: Scope, actual: Scope) -> GuardDecision {
    if actual >= required {
        return GuardDecision::Allow;
    }
    GuardDecision::Deny(GuardDenial {
        required,
        actual,
        reason: format!(
            "This view requires {required} level access; your access level is {actual}"
        ),
    })
}
