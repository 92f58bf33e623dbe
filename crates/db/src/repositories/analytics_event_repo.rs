//! Repository for the `analytics_events` table (append-only).

use eduscope_core::scope::QueryScope;
use eduscope_core::source::EventFilter;
use eduscope_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::event::{AnalyticsEventRow, EventBucketRow};
use crate::scope_sql::{BindValue, ScopeClause, ScopeColumns};

const COLUMNS: &str = "\
    e.id, e.school_id, e.user_id, e.event_category, e.event_type, \
    e.metadata, e.occurred_at";

/// Events have no student column; narrowed viewers see their own events.
pub(crate) const SCOPE: ScopeColumns = ScopeColumns {
    school: "e.school_id",
    student: None,
    actor: Some("e.user_id"),
};

pub struct AnalyticsEventRepo;

impl AnalyticsEventRepo {
    /// Latest events visible to `scope` since `filter.since`, newest first.
    pub async fn list_scoped(
        pool: &PgPool,
        scope: &QueryScope,
        filter: &EventFilter,
    ) -> Result<Vec<AnalyticsEventRow>, sqlx::Error> {
        let mut clause = ScopeClause::new(scope, SCOPE)
            .and_gte("e.occurred_at", Some(BindValue::Time(filter.since)));
        let limit = clause.trailing(BindValue::Int(filter.limit));
        let query = format!(
            "SELECT {COLUMNS} FROM analytics_events e{} \
             ORDER BY e.occurred_at DESC, e.id DESC \
             LIMIT {limit}",
            clause.sql()
        );
        clause
            .bind(sqlx::query_as::<_, AnalyticsEventRow>(&query))
            .fetch_all(pool)
            .await
    }

    /// Event counts per category and hour since `since`, over every row
    /// visible to `scope`.
    pub async fn bucket_scoped(
        pool: &PgPool,
        scope: &QueryScope,
        since: Timestamp,
    ) -> Result<Vec<EventBucketRow>, sqlx::Error> {
        let clause = ScopeClause::new(scope, SCOPE)
            .and_gte("e.occurred_at", Some(BindValue::Time(since)));
        let query = format!(
            "SELECT e.event_category AS category, \
                    date_trunc('hour', e.occurred_at) AS hour, \
                    COUNT(*) AS events \
             FROM analytics_events e{} \
             GROUP BY 1, 2 \
             ORDER BY 2, 1",
            clause.sql()
        );
        clause
            .bind(sqlx::query_as::<_, EventBucketRow>(&query))
            .fetch_all(pool)
            .await
    }

    /// Append one event.
    pub async fn insert(
        pool: &PgPool,
        school_id: Option<DbId>,
        user_id: Option<DbId>,
        event_category: &str,
        event_type: &str,
        metadata: &serde_json::Value,
    ) -> Result<AnalyticsEventRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO analytics_events AS e \
                 (school_id, user_id, event_category, event_type, metadata) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AnalyticsEventRow>(&query)
            .bind(school_id)
            .bind(user_id)
            .bind(event_category)
            .bind(event_type)
            .bind(metadata)
            .fetch_one(pool)
            .await
    }
}
