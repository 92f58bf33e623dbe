use eduscope_core::aggregation::activity::{AnalyticsEventRecord, EventBucket};
use eduscope_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from `analytics_events`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AnalyticsEventRow {
    pub id: DbId,
    pub school_id: Option<DbId>,
    pub user_id: Option<DbId>,
    pub event_category: String,
    pub event_type: String,
    pub metadata: serde_json::Value,
    pub occurred_at: Timestamp,
}

impl From<AnalyticsEventRow> for AnalyticsEventRecord {
    fn from(row: AnalyticsEventRow) -> Self {
        AnalyticsEventRecord {
            id: row.id,
            school_id: row.school_id,
            user_id: row.user_id,
            event_category: row.event_category,
            event_type: row.event_type,
            occurred_at: row.occurred_at,
            metadata: row.metadata,
        }
    }
}

/// One `GROUP BY category, hour` row.
#[derive(Debug, Clone, FromRow)]
pub struct EventBucketRow {
    pub category: String,
    pub hour: Timestamp,
    pub events: i64,
}

impl From<EventBucketRow> for EventBucket {
    fn from(row: EventBucketRow) -> Self {
        EventBucket {
            category: row.category,
            hour: row.hour,
            events: row.events,
        }
    }
}
