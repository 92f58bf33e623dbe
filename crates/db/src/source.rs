//! [`AnalyticsSource`] backed by the scoped repositories.

use async_trait::async_trait;
use eduscope_core::aggregation::activity::{AnalyticsEventRecord, EventBucket};
use eduscope_core::aggregation::attendance::AttendanceRecord;
use eduscope_core::aggregation::finance::{FeeRecord, TransactionRecord};
use eduscope_core::aggregation::grades::GradeRecord;
use eduscope_core::scope::QueryScope;
use eduscope_core::source::{
    AnalyticsSource, Counter, EventFilter, GradeFilter, RecordFilter, SourceError,
};
use eduscope_core::types::Timestamp;

use crate::repositories::{
    AnalyticsEventRepo, AttendanceRepo, FeeRepo, GradeRepo, StatsRepo, TransactionRepo,
};
use crate::DbPool;

pub struct PgAnalyticsSource {
    pool: DbPool,
}

impl PgAnalyticsSource {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Pool exhaustion is reported as a timeout; everything else as a backend
/// failure. The message stays server-side.
fn source_error(err: sqlx::Error) -> SourceError {
    tracing::error!(error = %err, "Analytics query failed");
    match err {
        sqlx::Error::PoolTimedOut => SourceError::Timeout,
        other => SourceError::Backend(other.to_string()),
    }
}

fn convert<R, T: From<R>>(rows: Vec<R>) -> Vec<T> {
    rows.into_iter().map(T::from).collect()
}

#[async_trait]
impl AnalyticsSource for PgAnalyticsSource {
    async fn ping(&self) -> Result<(), SourceError> {
        crate::health_check(&self.pool).await.map_err(source_error)
    }

    async fn fees(
        &self,
        scope: &QueryScope,
        filter: &RecordFilter,
    ) -> Result<Vec<FeeRecord>, SourceError> {
        FeeRepo::list_scoped(&self.pool, scope, filter)
            .await
            .map(convert)
            .map_err(source_error)
    }

    async fn transactions(
        &self,
        scope: &QueryScope,
        filter: &RecordFilter,
    ) -> Result<Vec<TransactionRecord>, SourceError> {
        TransactionRepo::list_scoped(&self.pool, scope, filter)
            .await
            .map(convert)
            .map_err(source_error)
    }

    async fn grades(
        &self,
        scope: &QueryScope,
        filter: &GradeFilter,
    ) -> Result<Vec<GradeRecord>, SourceError> {
        GradeRepo::list_scoped(&self.pool, scope, filter)
            .await
            .map(convert)
            .map_err(source_error)
    }

    async fn attendance(
        &self,
        scope: &QueryScope,
        filter: &RecordFilter,
    ) -> Result<Vec<AttendanceRecord>, SourceError> {
        AttendanceRepo::list_scoped(&self.pool, scope, filter)
            .await
            .map(convert)
            .map_err(source_error)
    }

    async fn events(
        &self,
        scope: &QueryScope,
        filter: &EventFilter,
    ) -> Result<Vec<AnalyticsEventRecord>, SourceError> {
        AnalyticsEventRepo::list_scoped(&self.pool, scope, filter)
            .await
            .map(convert)
            .map_err(source_error)
    }

    async fn event_buckets(
        &self,
        scope: &QueryScope,
        since: Timestamp,
    ) -> Result<Vec<EventBucket>, SourceError> {
        AnalyticsEventRepo::bucket_scoped(&self.pool, scope, since)
            .await
            .map(convert)
            .map_err(source_error)
    }

    async fn count(&self, scope: &QueryScope, counter: Counter) -> Result<i64, SourceError> {
        let pool = &self.pool;
        let result = match counter {
            Counter::Schools => StatsRepo::count_schools(pool, scope).await,
            Counter::Users => StatsRepo::count_users(pool, scope).await,
            Counter::Students => StatsRepo::count_students(pool, scope).await,
            Counter::ActiveUsers { since } => StatsRepo::count_active_users(pool, scope, since).await,
            Counter::Alerts { since } => StatsRepo::count_alerts(pool, scope, since).await,
        };
        result.map_err(source_error)
    }
}
