//! Permission and scope resolution.
//!
//! [`resolve`] turns an authenticated [`Viewer`] into a [`ResolvedScope`].
//! The only way to obtain a [`QueryScope`] (the value every data-source call
//! requires) is [`ResolvedScope::query_scope`], so a school-bound viewer can
//! never produce a query that reads another tenant's rows.

use serde::Serialize;

use crate::roles::Role;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Scope levels
// ---------------------------------------------------------------------------

/// Breadth of data a viewer may access, ordered by inclusion:
/// `Student < Class < School < System`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Student,
    Class,
    School,
    System,
}

impl Scope {
    pub const ALL: [Scope; 4] = [Scope::Student, Scope::Class, Scope::School, Scope::System];

    pub fn as_str(self) -> &'static str {
        match self {
            Scope::Student => "student",
            Scope::Class => "class",
            Scope::School => "school",
            Scope::System => "system",
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Viewer and resolution result
// ---------------------------------------------------------------------------

/// The authenticated user as seen by the analytics layer.
///
/// `role` is kept as the raw string from the session so unknown roles can be
/// reported literally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    pub user_id: DbId,
    pub role: String,
    pub school_id: Option<DbId>,
}

/// Schools a viewer may read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "ids")]
pub enum AllowedSchools {
    All,
    Only(Vec<DbId>),
}

impl AllowedSchools {
    pub fn contains(&self, school_id: DbId) -> bool {
        match self {
            AllowedSchools::All => true,
            AllowedSchools::Only(ids) => ids.contains(&school_id),
        }
    }
}

/// Output of [`resolve`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedScope {
    pub user_id: DbId,
    pub role: Role,
    pub scope: Scope,
    pub can_view_system_wide: bool,
    pub allowed_schools: AllowedSchools,
    /// The viewer's own school, if bound to one.
    pub school_id: Option<DbId>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScopeError {
    #[error("Access denied for role '{0}'")]
    UnknownRole(String),

    #[error("School assignment required for role '{role}'. Contact your administrator.")]
    AssignmentRequired { role: Role },

    #[error("School {requested} is outside the viewer's scope")]
    SchoolOutOfScope { requested: DbId },
}

/// Resolve what a viewer may see.
///
/// System administrators get system-wide access. Every other role is bound
/// to its own school and fails with [`ScopeError::AssignmentRequired`] when
/// no school is set.
pub fn resolve(viewer: &Viewer) -> Result<ResolvedScope, ScopeError> {
    let role: Role = viewer
        .role
        .parse()
        .map_err(|_| ScopeError::UnknownRole(viewer.role.clone()))?;

    if !role.requires_school() {
        return Ok(ResolvedScope {
            user_id: viewer.user_id,
            role,
            scope: Scope::System,
            can_view_system_wide: true,
            allowed_schools: AllowedSchools::All,
            school_id: viewer.school_id,
        });
    }

    let school_id = viewer
        .school_id
        .ok_or(ScopeError::AssignmentRequired { role })?;

    Ok(ResolvedScope {
        user_id: viewer.user_id,
        role,
        scope: role.default_scope(),
        can_view_system_wide: false,
        allowed_schools: AllowedSchools::Only(vec![school_id]),
        school_id: Some(school_id),
    })
}

// ---------------------------------------------------------------------------
// Query scope
// ---------------------------------------------------------------------------

/// How rows are narrowed below the school boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "user_id")]
pub enum Narrowing {
    /// Whole school (or all schools for system viewers).
    None,
    /// Only students in classes taught by this teacher.
    Teacher(DbId),
    /// Only students linked to this guardian.
    Guardian(DbId),
}

/// Scope parameters attached to every data-source call.
///
/// Fields are private: a `QueryScope` is built only by
/// [`ResolvedScope::query_scope`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct QueryScope {
    level: Scope,
    school_id: Option<DbId>,
    narrowing: Narrowing,
}

impl QueryScope {
    pub fn level(&self) -> Scope {
        self.level
    }

    /// `None` means all schools and only occurs for system viewers.
    pub fn school_id(&self) -> Option<DbId> {
        self.school_id
    }

    pub fn narrowing(&self) -> Narrowing {
        self.narrowing
    }
}

impl ResolvedScope {
    /// Build the query scope for a request.
    ///
    /// System viewers may target one school or, with `None`, every school.
    /// School-bound viewers always get their own school; asking for any other
    /// school is an error rather than a silent substitution.
    pub fn query_scope(&self, requested_school: Option<DbId>) -> Result<QueryScope, ScopeError> {
        if self.can_view_system_wide {
            return Ok(QueryScope {
                level: Scope::System,
                school_id: requested_school,
                narrowing: Narrowing::None,
            });
        }

        let Some(own) = self.school_id else {
            return Err(ScopeError::AssignmentRequired { role: self.role });
        };
        if let Some(requested) = requested_school {
            if requested != own || !self.allowed_schools.contains(requested) {
                return Err(ScopeError::SchoolOutOfScope { requested });
            }
        }

        let narrowing = match self.scope {
            Scope::System | Scope::School => Narrowing::None,
            Scope::Class => Narrowing::Teacher(self.user_id),
            Scope::Student => Narrowing::Guardian(self.user_id),
        };

        Ok(QueryScope {
            level: self.scope,
            school_id: Some(own),
            narrowing,
        })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn viewer(role: &str, school_id: Option<DbId>) -> Viewer {
        Viewer {
            user_id: 7,
            role: role.to_string(),
            school_id,
        }
    }

    #[test]
    fn scope_order_is_total() {
        assert!(Scope::System > Scope::School);
        assert!(Scope::School > Scope::Class);
        assert!(Scope::Class > Scope::Student);
    }

    #[test]
    fn system_admin_sees_everything() {
        let resolved = resolve(&viewer("system_admin", None)).unwrap();
        assert!(resolved.can_view_system_wide);
        assert_eq!(resolved.scope, Scope::System);
        assert_eq!(resolved.allowed_schools, AllowedSchools::All);
    }

    #[test]
    fn school_bound_roles_get_their_school() {
        for (role, scope) in [
            ("school_owner", Scope::School),
            ("principal", Scope::School),
            ("finance_officer", Scope::School),
            ("teacher", Scope::Class),
            ("parent", Scope::Student),
        ] {
            let resolved = resolve(&viewer(role, Some(3))).unwrap();
            assert!(!resolved.can_view_system_wide, "{role}");
            assert_eq!(resolved.scope, scope, "{role}");
            assert_eq!(resolved.allowed_schools, AllowedSchools::Only(vec![3]));
        }
    }

    #[test]
    fn missing_school_is_an_error() {
        let err = resolve(&viewer("teacher", None)).unwrap_err();
        assert_eq!(err, ScopeError::AssignmentRequired { role: Role::Teacher });
        assert!(err.to_string().contains("School assignment required"));
    }

    #[test]
    fn unknown_role_is_reported_literally() {
        let err = resolve(&viewer("unknown_role", Some(1))).unwrap_err();
        assert_eq!(err.to_string(), "Access denied for role 'unknown_role'");
    }

    #[test]
    fn bound_viewer_cannot_request_another_school() {
        let resolved = resolve(&viewer("principal", Some(3))).unwrap();
        assert_matches!(
            resolved.query_scope(Some(4)),
            Err(ScopeError::SchoolOutOfScope { requested: 4 })
        );
        let own = resolved.query_scope(Some(3)).unwrap();
        assert_eq!(own.school_id(), Some(3));
    }

    #[test]
    fn bound_viewer_never_gets_all_schools() {
        for role in ["school_owner", "principal", "teacher", "parent", "finance_officer"] {
            for school in 1..=20 {
                let resolved = resolve(&viewer(role, Some(school))).unwrap();
                let qs = resolved.query_scope(None).unwrap();
                assert_eq!(qs.school_id(), Some(school), "{role}/{school}");
                assert_ne!(qs.level(), Scope::System);
            }
        }
    }

    #[test]
    fn system_viewer_may_pick_a_school() {
        let resolved = resolve(&viewer("system_admin", None)).unwrap();
        assert_eq!(resolved.query_scope(None).unwrap().school_id(), None);
        assert_eq!(resolved.query_scope(Some(9)).unwrap().school_id(), Some(9));
    }

    #[test]
    fn narrowing_follows_scope() {
        let teacher = resolve(&viewer("teacher", Some(2))).unwrap();
        assert_eq!(teacher.query_scope(None).unwrap().narrowing(), Narrowing::Teacher(7));

        let parent = resolve(&viewer("parent", Some(2))).unwrap();
        assert_eq!(parent.query_scope(None).unwrap().narrowing(), Narrowing::Guardian(7));

        let owner = resolve(&viewer("school_owner", Some(2))).unwrap();
        assert_eq!(owner.query_scope(None).unwrap().narrowing(), Narrowing::None);
    }
}
