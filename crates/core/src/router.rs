//! Role router: maps a role string to the dashboard view it renders.
//!
//! The mapping is total. Known roles dispatch through an exhaustive `match`
//! on [`Role`]; anything else becomes [`DashboardView::AccessDenied`] carrying
//! the literal role string.

use std::time::Duration;

use serde::Serialize;

use crate::roles::Role;
use crate::scope::Scope;

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// A data section a dashboard view is composed of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Finance,
    Transactions,
    Grades,
    Attendance,
    Activity,
    SystemStats,
}

impl Section {
    pub fn as_str(self) -> &'static str {
        match self {
            Section::Finance => "finance",
            Section::Transactions => "transactions",
            Section::Grades => "grades",
            Section::Attendance => "attendance",
            Section::Activity => "activity",
            Section::SystemStats => "system_stats",
        }
    }

    /// Minimum scope the guard requires before this section is fetched.
    pub fn required_scope(self) -> Scope {
        match self {
            Section::Grades | Section::Attendance => Scope::Student,
            Section::Finance | Section::Transactions | Section::Activity => Scope::School,
            Section::SystemStats => Scope::System,
        }
    }

    /// How long a computed summary stays fresh.
    pub fn stale_after(self) -> Duration {
        match self {
            Section::Activity => Duration::from_secs(30),
            Section::SystemStats => Duration::from_secs(60),
            Section::Finance | Section::Transactions => Duration::from_secs(300),
            Section::Grades | Section::Attendance => Duration::from_secs(600),
        }
    }

    /// Suggested client auto-refresh interval for real-time sections.
    pub fn refresh_interval(self) -> Option<Duration> {
        match self {
            Section::Activity => Some(Duration::from_secs(10)),
            Section::SystemStats => Some(Duration::from_secs(60)),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum DashboardView {
    SystemOverview,
    SchoolOverview,
    AcademicOverview,
    Classroom,
    Guardian,
    Finance,
    AccessDenied { role: String },
}

/// Route a raw role string to a view. Never fails.
pub fn route(role: &str) -> DashboardView {
    match role.parse::<Role>() {
        Ok(role) => DashboardView::for_role(role),
        Err(unknown) => DashboardView::AccessDenied { role: unknown.0 },
    }
}

impl DashboardView {
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::SystemAdmin => DashboardView::SystemOverview,
            Role::SchoolOwner => DashboardView::SchoolOverview,
            Role::Principal => DashboardView::AcademicOverview,
            Role::Teacher => DashboardView::Classroom,
            Role::Parent => DashboardView::Guardian,
            Role::FinanceOfficer => DashboardView::Finance,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DashboardView::SystemOverview => "system_overview",
            DashboardView::SchoolOverview => "school_overview",
            DashboardView::AcademicOverview => "academic_overview",
            DashboardView::Classroom => "classroom",
            DashboardView::Guardian => "guardian",
            DashboardView::Finance => "finance",
            DashboardView::AccessDenied { .. } => "access_denied",
        }
    }

    /// Revenue widgets are hidden from these views. Display only; the guard
    /// still decides what may be fetched.
    pub fn hides_revenue(&self) -> bool {
        matches!(
            self,
            DashboardView::AcademicOverview | DashboardView::Classroom | DashboardView::Guardian
        )
    }

    /// Sections composed by this view, in display order.
    pub fn sections(&self) -> Vec<Section> {
        let base: &[Section] = match self {
            DashboardView::SystemOverview => &[
                Section::SystemStats,
                Section::Finance,
                Section::Transactions,
                Section::Activity,
            ],
            DashboardView::SchoolOverview => &[
                Section::Finance,
                Section::Transactions,
                Section::Grades,
                Section::Attendance,
                Section::Activity,
            ],
            DashboardView::AcademicOverview => &[
                Section::Grades,
                Section::Attendance,
                Section::Finance,
                Section::Transactions,
                Section::Activity,
            ],
            DashboardView::Classroom | DashboardView::Guardian => {
                &[Section::Grades, Section::Attendance]
            }
            DashboardView::Finance => &[Section::Finance, Section::Transactions],
            DashboardView::AccessDenied { .. } => &[],
        };
        base.iter()
            .copied()
            .filter(|s| !(self.hides_revenue() && *s == Section::Transactions))
            .collect()
    }

    /// Suggested client refresh interval, if any section is real-time.
    pub fn refresh_interval(&self) -> Option<Duration> {
        self.sections()
            .into_iter()
            .filter_map(Section::refresh_interval)
            .min()
    }
}
