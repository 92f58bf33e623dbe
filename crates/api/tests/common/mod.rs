#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::AUTHORIZATION;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use chrono::{DurationRound, TimeDelta};
use http_body_util::BodyExt;
use tower::ServiceExt;

use eduscope_api::auth::jwt::{generate_access_token, JwtConfig};
use eduscope_api::config::{DashboardConfig, ServerConfig};
use eduscope_api::routes;
use eduscope_api::state::AppState;
use eduscope_core::aggregation::activity::{AnalyticsEventRecord, EventBucket};
use eduscope_core::aggregation::attendance::AttendanceRecord;
use eduscope_core::aggregation::finance::{FeeRecord, FeeStatus, TransactionRecord};
use eduscope_core::aggregation::grades::GradeRecord;
use eduscope_core::scope::QueryScope;
use eduscope_core::source::{
    AnalyticsSource, Counter, EventFilter, GradeFilter, RecordFilter, SourceError,
};
use eduscope_core::types::{DbId, Timestamp};

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default)
/// and a 30-second request timeout.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 15,
        },
        dashboard: DashboardConfig {
            load_timeout_secs: 5,
            ..DashboardConfig::default()
        },
    }
}

/// Build the full application router backed by the given analytics source,
/// with the same middleware stack production uses.
pub fn build_test_app(source: Arc<dyn AnalyticsSource>) -> Router {
    let config = test_config();
    routes::app(AppState::new(source, config.clone()), &config)
}

/// Issue an access token signed with the test secret.
pub fn token_for(user_id: DbId, role: &str, school_id: Option<DbId>) -> String {
    generate_access_token(user_id, role, school_id, &test_config().jwt)
        .expect("token generation should succeed")
}

/// Send an unauthenticated GET request.
pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Send a GET request with a Bearer token.
pub async fn get_with_token(app: Router, uri: &str, token: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// In-memory analytics source
// ---------------------------------------------------------------------------

/// An [`AnalyticsSource`] over in-memory rows that records every call.
///
/// Rows are filtered by the scope's school, so tests can seed several
/// tenants and check nothing leaks across.
#[derive(Default)]
pub struct RecordingSource {
    pub fees: Vec<FeeRecord>,
    pub transactions: Vec<TransactionRecord>,
    pub grades: Vec<GradeRecord>,
    pub attendance: Vec<AttendanceRecord>,
    pub events: Vec<AnalyticsEventRecord>,
    /// Operation names that fail with a backend error.
    pub failing: HashSet<&'static str>,
    pub healthy: bool,
    pub calls: AtomicUsize,
    pub scopes: Mutex<Vec<QueryScope>>,
    pub grade_filters: Mutex<Vec<GradeFilter>>,
}

impl RecordingSource {
    pub fn healthy() -> Self {
        Self {
            healthy: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self, name: &'static str, scope: &QueryScope) -> Result<(), SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.scopes.lock().unwrap().push(*scope);
        if self.failing.contains(name) {
            return Err(SourceError::Backend(format!("{name} unavailable")));
        }
        Ok(())
    }
}

impl RecordingSource {
    fn visible_events(&self, scope: &QueryScope, since: Timestamp) -> Vec<AnalyticsEventRecord> {
        self.events
            .iter()
            .filter(|e| e.occurred_at >= since)
            .filter(|e| e.school_id.is_some_and(|s| in_scope(scope, s)))
            .cloned()
            .collect()
    }
}

fn in_scope(scope: &QueryScope, school_id: DbId) -> bool {
    scope.school_id().map_or(true, |s| s == school_id)
}

#[async_trait]
impl AnalyticsSource for RecordingSource {
    async fn ping(&self) -> Result<(), SourceError> {
        if self.healthy {
            Ok(())
        } else {
            Err(SourceError::Backend("connection refused".into()))
        }
    }

    async fn fees(
        &self,
        scope: &QueryScope,
        _filter: &RecordFilter,
    ) -> Result<Vec<FeeRecord>, SourceError> {
        self.hit("fees", scope)?;
        Ok(self
            .fees
            .iter()
            .filter(|f| in_scope(scope, f.school_id))
            .cloned()
            .collect())
    }

    async fn transactions(
        &self,
        scope: &QueryScope,
        _filter: &RecordFilter,
    ) -> Result<Vec<TransactionRecord>, SourceError> {
        self.hit("transactions", scope)?;
        Ok(self
            .transactions
            .iter()
            .filter(|t| in_scope(scope, t.school_id))
            .cloned()
            .collect())
    }

    async fn grades(
        &self,
        scope: &QueryScope,
        filter: &GradeFilter,
    ) -> Result<Vec<GradeRecord>, SourceError> {
        self.hit("grades", scope)?;
        self.grade_filters.lock().unwrap().push(filter.clone());
        Ok(self.grades.clone())
    }

    async fn attendance(
        &self,
        scope: &QueryScope,
        _filter: &RecordFilter,
    ) -> Result<Vec<AttendanceRecord>, SourceError> {
        self.hit("attendance", scope)?;
        Ok(self.attendance.clone())
    }

    async fn events(
        &self,
        scope: &QueryScope,
        filter: &EventFilter,
    ) -> Result<Vec<AnalyticsEventRecord>, SourceError> {
        self.hit("events", scope)?;
        let mut visible = self.visible_events(scope, filter.since);
        visible.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at).then(b.id.cmp(&a.id)));
        visible.truncate(filter.limit.max(0) as usize);
        Ok(visible)
    }

    async fn event_buckets(
        &self,
        scope: &QueryScope,
        since: Timestamp,
    ) -> Result<Vec<EventBucket>, SourceError> {
        self.hit("event_buckets", scope)?;
        let mut buckets: BTreeMap<(String, Timestamp), i64> = BTreeMap::new();
        for e in self.visible_events(scope, since) {
            let hour = e
                .occurred_at
                .duration_trunc(TimeDelta::hours(1))
                .unwrap_or(e.occurred_at);
            *buckets.entry((e.event_category, hour)).or_default() += 1;
        }
        Ok(buckets
            .into_iter()
            .map(|((category, hour), events)| EventBucket {
                category,
                hour,
                events,
            })
            .collect())
    }

    async fn count(&self, scope: &QueryScope, counter: Counter) -> Result<i64, SourceError> {
        self.hit(counter.as_str(), scope)?;
        let value = match counter {
            Counter::Schools => 2,
            Counter::Users => 40,
            Counter::Students => 600,
            Counter::ActiveUsers { .. } => 12,
            Counter::Alerts { .. } => 1,
        };
        Ok(value)
    }
}

/// A fee row for `school_id`.
pub fn fee(id: DbId, school_id: DbId, amount: f64, paid: f64) -> FeeRecord {
    FeeRecord {
        id,
        school_id,
        student_id: id,
        student_name: format!("Student {id}"),
        amount,
        paid_amount: paid,
        status: if paid >= amount {
            FeeStatus::Paid
        } else {
            FeeStatus::Pending
        },
        created_at: "2026-02-01T08:00:00Z".parse().unwrap(),
    }
}
