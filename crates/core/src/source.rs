//! Data-source strategy.
//!
//! The composer never talks to a database directly. Every fetch goes through
//! [`AnalyticsSource`], and every method takes a [`QueryScope`], which can
//! only be produced by the scope resolver. Implementations must apply the
//! scope's school and narrowing to every row they return.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::aggregation::activity::{AnalyticsEventRecord, EventBucket};
use crate::aggregation::attendance::AttendanceRecord;
use crate::aggregation::finance::{FeeRecord, TransactionRecord};
use crate::aggregation::grades::GradeRecord;
use crate::retry::Retryable;
use crate::scope::QueryScope;
use crate::types::{DbId, Timestamp};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    /// The backend failed (connection, query or decode error).
    #[error("Data source error: {0}")]
    Backend(String),

    #[error("Data source timed out")]
    Timeout,

    /// The source cannot answer this kind of query.
    #[error("Unsupported query: {0}")]
    Unsupported(&'static str),
}

impl Retryable for SourceError {
    fn is_retryable(&self) -> bool {
        matches!(self, SourceError::Backend(_) | SourceError::Timeout)
    }
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// Optional narrowing requested by the client, on top of the viewer's scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize)]
pub struct RecordFilter {
    /// Academic term label, e.g. `2026-T1`.
    pub term: Option<String>,
    /// Inclusive lower date bound.
    pub from: Option<NaiveDate>,
    /// Inclusive upper date bound.
    pub to: Option<NaiveDate>,
    pub class_id: Option<DbId>,
}

impl RecordFilter {
    /// `from` must not be after `to`.
    pub fn validate(&self) -> Result<(), String> {
        match (self.from, self.to) {
            (Some(from), Some(to)) if from > to => {
                Err(format!("'from' ({from}) must not be after 'to' ({to})"))
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GradeFilter {
    pub record: RecordFilter,
    /// Only grades whose workflow reached `released`. Guardians only ever
    /// see released grades.
    pub released_only: bool,
}

/// Newest-first slice of the event feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFilter {
    pub since: Timestamp,
    pub limit: i64,
}

/// Platform counters for the system overview.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    Schools,
    Users,
    Students,
    /// Distinct users with at least one analytics event since the instant.
    ActiveUsers { since: Timestamp },
    /// Analytics events in the `alert` category since the instant.
    Alerts { since: Timestamp },
}

impl Counter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Counter::Schools => "schools",
            Counter::Users => "users",
            Counter::Students => "students",
            Counter::ActiveUsers { .. } => "active_users",
            Counter::Alerts { .. } => "alerts",
        }
    }
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

#[async_trait]
pub trait AnalyticsSource: Send + Sync {
    /// Cheap liveness check used by the health endpoint.
    async fn ping(&self) -> Result<(), SourceError>;

    async fn fees(
        &self,
        scope: &QueryScope,
        filter: &RecordFilter,
    ) -> Result<Vec<FeeRecord>, SourceError>;

    async fn transactions(
        &self,
        scope: &QueryScope,
        filter: &RecordFilter,
    ) -> Result<Vec<TransactionRecord>, SourceError>;

    async fn grades(
        &self,
        scope: &QueryScope,
        filter: &GradeFilter,
    ) -> Result<Vec<GradeRecord>, SourceError>;

    async fn attendance(
        &self,
        scope: &QueryScope,
        filter: &RecordFilter,
    ) -> Result<Vec<AttendanceRecord>, SourceError>;

    async fn events(
        &self,
        scope: &QueryScope,
        filter: &EventFilter,
    ) -> Result<Vec<AnalyticsEventRecord>, SourceError>;

    /// Event counts per category and hour since `since`, computed over every
    /// matching row rather than a page of them.
    async fn event_buckets(
        &self,
        scope: &QueryScope,
        since: Timestamp,
    ) -> Result<Vec<EventBucket>, SourceError>;

    async fn count(&self, scope: &QueryScope, counter: Counter) -> Result<i64, SourceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_errors_are_retryable() {
        assert!(SourceError::Backend("reset".into()).is_retryable());
        assert!(SourceError::Timeout.is_retryable());
        assert!(!SourceError::Unsupported("pivot").is_retryable());
    }

    #[test]
    fn filter_rejects_inverted_range() {
        let filter = RecordFilter {
            from: NaiveDate::from_ymd_opt(2026, 3, 10),
            to: NaiveDate::from_ymd_opt(2026, 3, 1),
            ..Default::default()
        };
        assert!(filter.validate().is_err());
        assert!(RecordFilter::default().validate().is_ok());
    }
}
