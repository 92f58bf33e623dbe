//! Platform counters for the system overview.

use eduscope_core::aggregation::activity::ALERT_CATEGORY;
use eduscope_core::scope::QueryScope;
use eduscope_core::types::Timestamp;
use sqlx::PgPool;

use crate::repositories::analytics_event_repo;
use crate::scope_sql::{BindValue, ScopeClause, ScopeColumns};

const SCHOOLS: ScopeColumns = ScopeColumns {
    school: "sc.id",
    student: None,
    actor: None,
};

const USERS: ScopeColumns = ScopeColumns {
    school: "u.school_id",
    student: None,
    actor: Some("u.id"),
};

const STUDENTS: ScopeColumns = ScopeColumns {
    school: "st.school_id",
    student: Some("st.id"),
    actor: None,
};

pub struct StatsRepo;

impl StatsRepo {
    async fn count(pool: &PgPool, from: &str, clause: ScopeClause) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*) FROM {from}{}", clause.sql());
        clause
            .bind_scalar(sqlx::query_scalar::<_, i64>(&query))
            .fetch_one(pool)
            .await
    }

    pub async fn count_schools(pool: &PgPool, scope: &QueryScope) -> Result<i64, sqlx::Error> {
        let clause = ScopeClause::new(scope, SCHOOLS).and_raw("sc.is_active");
        Self::count(pool, "schools sc", clause).await
    }

    pub async fn count_users(pool: &PgPool, scope: &QueryScope) -> Result<i64, sqlx::Error> {
        let clause = ScopeClause::new(scope, USERS).and_raw("u.is_active");
        Self::count(pool, "users u", clause).await
    }

    pub async fn count_students(pool: &PgPool, scope: &QueryScope) -> Result<i64, sqlx::Error> {
        let clause = ScopeClause::new(scope, STUDENTS).and_raw("st.is_active");
        Self::count(pool, "students st", clause).await
    }

    /// Distinct users with at least one analytics event since `since`.
    pub async fn count_active_users(
        pool: &PgPool,
        scope: &QueryScope,
        since: Timestamp,
    ) -> Result<i64, sqlx::Error> {
        let clause = ScopeClause::new(scope, analytics_event_repo::SCOPE)
            .and_gte("e.occurred_at", Some(BindValue::Time(since)))
            .and_raw("e.user_id IS NOT NULL");
        let query = format!(
            "SELECT COUNT(DISTINCT e.user_id) FROM analytics_events e{}",
            clause.sql()
        );
        clause
            .bind_scalar(sqlx::query_scalar::<_, i64>(&query))
            .fetch_one(pool)
            .await
    }

    /// Alert-category events since `since`.
    pub async fn count_alerts(
        pool: &PgPool,
        scope: &QueryScope,
        since: Timestamp,
    ) -> Result<i64, sqlx::Error> {
        let clause = ScopeClause::new(scope, analytics_event_repo::SCOPE)
            .and_gte("e.occurred_at", Some(BindValue::Time(since)))
            .and_eq("e.event_category", Some(BindValue::Text(ALERT_CATEGORY.to_string())));
        Self::count(pool, "analytics_events e", clause).await
    }
}
