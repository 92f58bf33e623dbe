//! Repository for the `grades` table.

use eduscope_core::scope::QueryScope;
use eduscope_core::source::GradeFilter;
use sqlx::PgPool;

use crate::models::academic::GradeRow;
use crate::scope_sql::{BindValue, ScopeClause, ScopeColumns};

/// Column list for scoped grade queries (`g` = grades, `s` = students,
/// `sub` = subjects).
const COLUMNS: &str = "\
    g.student_id, s.full_name AS student_name, g.subject_id, \
    sub.name AS subject_name, g.class_id, g.percentage, g.letter_grade, \
    g.status, g.term";

const SCOPE: ScopeColumns = ScopeColumns {
    school: "g.school_id",
    student: Some("g.student_id"),
    actor: None,
};

pub struct GradeRepo;

impl GradeRepo {
    /// Grades visible to `scope`. With `released_only`, grades still in the
    /// approval workflow are excluded.
    pub async fn list_scoped(
        pool: &PgPool,
        scope: &QueryScope,
        filter: &GradeFilter,
    ) -> Result<Vec<GradeRow>, sqlx::Error> {
        let record = &filter.record;
        let mut clause = ScopeClause::new(scope, SCOPE)
            .and_eq("g.term", record.term.clone().map(BindValue::Text))
            .and_eq("g.class_id", record.class_id.map(BindValue::Id))
            .and_gte("g.assessed_on", record.from.map(BindValue::Date))
            .and_lte("g.assessed_on", record.to.map(BindValue::Date));
        if filter.released_only {
            clause = clause.and_raw("g.status = 'released'");
        }
        let query = format!(
            "SELECT {COLUMNS} FROM grades g \
             JOIN students s ON s.id = g.student_id \
             JOIN subjects sub ON sub.id = g.subject_id{} \
             ORDER BY g.student_id, g.subject_id, g.id",
            clause.sql()
        );
        clause
            .bind(sqlx::query_as::<_, GradeRow>(&query))
            .fetch_all(pool)
            .await
    }
}
