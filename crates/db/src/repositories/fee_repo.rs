//! Repository for the `fees` table.

use eduscope_core::scope::QueryScope;
use eduscope_core::source::RecordFilter;
use sqlx::PgPool;

use crate::models::finance::FeeRow;
use crate::scope_sql::{BindValue, ScopeClause, ScopeColumns};

/// Column list for scoped fee queries (`f` = fees, `s` = students).
const COLUMNS: &str = "\
    f.id, f.school_id, f.student_id, s.full_name AS student_name, \
    f.amount, f.paid_amount, f.status, f.created_at";

const SCOPE: ScopeColumns = ScopeColumns {
    school: "f.school_id",
    student: Some("f.student_id"),
    actor: None,
};

pub struct FeeRepo;

impl FeeRepo {
    /// Fees visible to `scope`, optionally filtered by term, class and
    /// creation date.
    pub async fn list_scoped(
        pool: &PgPool,
        scope: &QueryScope,
        filter: &RecordFilter,
    ) -> Result<Vec<FeeRow>, sqlx::Error> {
        let clause = ScopeClause::new(scope, SCOPE)
            .and_eq("f.term", filter.term.clone().map(BindValue::Text))
            .and_eq("s.class_id", filter.class_id.map(BindValue::Id))
            .and_gte("f.created_at::date", filter.from.map(BindValue::Date))
            .and_lte("f.created_at::date", filter.to.map(BindValue::Date));
        let query = format!(
            "SELECT {COLUMNS} FROM fees f \
             JOIN students s ON s.id = f.student_id{} \
             ORDER BY f.id",
            clause.sql()
        );
        clause
            .bind(sqlx::query_as::<_, FeeRow>(&query))
            .fetch_all(pool)
            .await
    }
}
