//! Repository for the `attendance_records` table.

use eduscope_core::scope::QueryScope;
use eduscope_core::source::RecordFilter;
use sqlx::PgPool;

use crate::models::academic::AttendanceRow;
use crate::scope_sql::{BindValue, ScopeClause, ScopeColumns};

const COLUMNS: &str = "\
    a.student_id, s.full_name AS student_name, a.class_id, \
    c.name AS class_name, a.date, a.status";

const SCOPE: ScopeColumns = ScopeColumns {
    school: "a.school_id",
    student: Some("a.student_id"),
    actor: None,
};

pub struct AttendanceRepo;

impl AttendanceRepo {
    pub async fn list_scoped(
        pool: &PgPool,
        scope: &QueryScope,
        filter: &RecordFilter,
    ) -> Result<Vec<AttendanceRow>, sqlx::Error> {
        let clause = ScopeClause::new(scope, SCOPE)
            .and_eq("a.class_id", filter.class_id.map(BindValue::Id))
            .and_gte("a.date", filter.from.map(BindValue::Date))
            .and_lte("a.date", filter.to.map(BindValue::Date));
        let query = format!(
            "SELECT {COLUMNS} FROM attendance_records a \
             JOIN students s ON s.id = a.student_id \
             JOIN classes c ON c.id = a.class_id{} \
             ORDER BY a.date, a.student_id",
            clause.sql()
        );
        clause
            .bind(sqlx::query_as::<_, AttendanceRow>(&query))
            .fetch_all(pool)
            .await
    }
}
