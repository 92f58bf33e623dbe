//! Repository for the `transactions` table.

use eduscope_core::scope::QueryScope;
use eduscope_core::source::RecordFilter;
use sqlx::PgPool;

use crate::models::finance::TransactionRow;
use crate::scope_sql::{BindValue, ScopeClause, ScopeColumns};

const COLUMNS: &str = "\
    t.id, t.school_id, t.student_id, t.amount, t.method, t.kind, t.occurred_at";

/// Transactions without a student never match a narrowed scope.
const SCOPE: ScopeColumns = ScopeColumns {
    school: "t.school_id",
    student: Some("t.student_id"),
    actor: None,
};

pub struct TransactionRepo;

impl TransactionRepo {
    pub async fn list_scoped(
        pool: &PgPool,
        scope: &QueryScope,
        filter: &RecordFilter,
    ) -> Result<Vec<TransactionRow>, sqlx::Error> {
        let clause = ScopeClause::new(scope, SCOPE)
            .and_eq("fe.term", filter.term.clone().map(BindValue::Text))
            .and_eq("s.class_id", filter.class_id.map(BindValue::Id))
            .and_gte("t.occurred_at::date", filter.from.map(BindValue::Date))
            .and_lte("t.occurred_at::date", filter.to.map(BindValue::Date));
        let query = format!(
            "SELECT {COLUMNS} FROM transactions t \
             LEFT JOIN students s ON s.id = t.student_id \
             LEFT JOIN fees fe ON fe.id = t.fee_id{} \
             ORDER BY t.occurred_at, t.id",
            clause.sql()
        );
        clause
            .bind(sqlx::query_as::<_, TransactionRow>(&query))
            .fetch_all(pool)
            .await
    }
}
