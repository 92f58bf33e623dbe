//! Scoped read repositories.
//!
//! Every query takes a [`QueryScope`](eduscope_core::scope::QueryScope) and
//! renders it through [`ScopeClause`](crate::scope_sql::ScopeClause); there
//! is no unscoped read path.

pub mod analytics_event_repo;
pub mod attendance_repo;
pub mod fee_repo;
pub mod grade_repo;
pub mod stats_repo;
pub mod transaction_repo;

pub use analytics_event_repo::AnalyticsEventRepo;
pub use attendance_repo::AttendanceRepo;
pub use fee_repo::FeeRepo;
pub use grade_repo::GradeRepo;
pub use stats_repo::StatsRepo;
pub use transaction_repo::TransactionRepo;
