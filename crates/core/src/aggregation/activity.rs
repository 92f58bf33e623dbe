//! Analytics-event feed aggregation for the real-time activity widget.

use std::collections::BTreeMap;

use chrono::{DurationRound, TimeDelta};
use serde::Serialize;

use crate::types::{DbId, Timestamp};

/// Category used for alert events.
pub const ALERT_CATEGORY: &str = "alert";
/// Default number of latest events returned.
pub const RECENT_EVENTS: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsEventRecord {
    pub id: DbId,
    pub school_id: Option<DbId>,
    pub user_id: Option<DbId>,
    pub event_category: String,
    pub event_type: String,
    pub occurred_at: Timestamp,
    pub metadata: serde_json::Value,
}

/// Event count for one category within one hour, aggregated by the source.
#[derive(Debug, Clone, PartialEq)]
pub struct EventBucket {
    pub category: String,
    pub hour: Timestamp,
    pub events: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyCount {
    pub hour: Timestamp,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentEvent {
    pub id: DbId,
    pub event_category: String,
    pub event_type: String,
    pub occurred_at: Timestamp,
    pub metadata: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivitySummary {
    pub total_events: u64,
    pub distinct_users: u64,
    pub alerts: u64,
    pub by_category: Vec<CategoryCount>,
    pub hourly: Vec<HourlyCount>,
    pub recent: Vec<RecentEvent>,
}

impl ActivitySummary {
    pub fn is_empty(&self) -> bool {
        self.total_events == 0
    }
}

/// Fold per-hour category buckets into an [`ActivitySummary`].
///
/// Totals come from `buckets` and `distinct_users`, never from `latest`,
/// which is only the newest slice of the feed. At most `recent_limit` of
/// those are kept (ties broken by id, newest first).
pub fn summarize_activity(
    buckets: &[EventBucket],
    distinct_users: i64,
    latest: &[AnalyticsEventRecord],
    recent_limit: usize,
) -> ActivitySummary {
    let mut by_category: BTreeMap<&str, u64> = BTreeMap::new();
    let mut hourly: BTreeMap<Timestamp, u64> = BTreeMap::new();
    let mut total = 0u64;
    let mut alerts = 0u64;

    for b in buckets {
        let n = b.events.max(0) as u64;
        if n == 0 {
            continue;
        }
        *by_category.entry(b.category.as_str()).or_default() += n;
        let hour = b.hour.duration_trunc(TimeDelta::hours(1)).unwrap_or(b.hour);
        *hourly.entry(hour).or_default() += n;
        total += n;
        if b.category == ALERT_CATEGORY {
            alerts += n;
        }
    }

    let mut categories: Vec<CategoryCount> = by_category
        .into_iter()
        .map(|(category, count)| CategoryCount {
            category: category.to_string(),
            count,
        })
        .collect();
    categories.sort_by(|a, b| b.count.cmp(&a.count).then(a.category.cmp(&b.category)));

    let mut latest: Vec<&AnalyticsEventRecord> = latest.iter().collect();
    latest.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at).then(b.id.cmp(&a.id)));

    ActivitySummary {
        total_events: total,
        distinct_users: distinct_users.max(0) as u64,
        alerts,
        by_category: categories,
        hourly: hourly
            .into_iter()
            .map(|(hour, count)| HourlyCount { hour, count })
            .collect(),
        recent: latest
            .into_iter()
            .take(recent_limit)
            .map(|e| RecentEvent {
                id: e.id,
                event_category: e.event_category.clone(),
                event_type: e.event_type.clone(),
                occurred_at: e.occurred_at,
                metadata: e.metadata.clone(),
            })
            .collect(),
    }
}
