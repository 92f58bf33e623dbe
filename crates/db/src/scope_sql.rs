//! Renders a [`QueryScope`] and request filters into a SQL `WHERE` clause.
//!
//! Every scoped repository query goes through [`ScopeClause`]. The clause
//! numbers its own `$n` placeholders and keeps the bind values in the same
//! order, so callers only append [`ScopeClause::sql`] to their `SELECT` and
//! hand the query to [`ScopeClause::bind`].
//!
//! Narrowed scopes that cannot be expressed for a table render `FALSE`, so a
//! missing column never widens what a viewer sees.

use chrono::NaiveDate;
use eduscope_core::scope::{Narrowing, QueryScope};
use eduscope_core::types::{DbId, Timestamp};
use sqlx::postgres::PgArguments;
use sqlx::query::{QueryAs, QueryScalar};
use sqlx::Postgres;

/// Columns a table exposes for scoping.
#[derive(Debug, Clone, Copy)]
pub struct ScopeColumns {
    /// Tenant column, e.g. `f.school_id`.
    pub school: &'static str,
    /// Student column used for teacher and guardian narrowing.
    pub student: Option<&'static str>,
    /// Acting-user column used when the table has no student column.
    pub actor: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Id(DbId),
    Int(i64),
    Text(String),
    Date(NaiveDate),
    Time(Timestamp),
}

#[derive(Debug, Clone, Default)]
pub struct ScopeClause {
    predicates: Vec<String>,
    binds: Vec<BindValue>,
}

impl ScopeClause {
    /// Start a clause restricted to `scope`.
    pub fn new(scope: &QueryScope, columns: ScopeColumns) -> Self {
        let mut clause = Self::default();

        if let Some(school_id) = scope.school_id() {
            let p = clause.param(BindValue::Id(school_id));
            clause.predicates.push(format!("{} = {p}", columns.school));
        }

        match scope.narrowing() {
            Narrowing::None => {}
            Narrowing::Teacher(teacher_id) => match (columns.student, columns.actor) {
                (Some(student), _) => {
                    let p = clause.param(BindValue::Id(teacher_id));
                    clause.predicates.push(format!(
                        "{student} IN (SELECT s.id FROM students s \
                         JOIN class_teachers ct ON ct.class_id = s.class_id \
                         WHERE ct.teacher_id = {p})"
                    ));
                }
                (None, Some(actor)) => {
                    let p = clause.param(BindValue::Id(teacher_id));
                    clause.predicates.push(format!("{actor} = {p}"));
                }
                (None, None) => clause.predicates.push("FALSE".to_string()),
            },
            Narrowing::Guardian(guardian_id) => match (columns.student, columns.actor) {
                (Some(student), _) => {
                    let p = clause.param(BindValue::Id(guardian_id));
                    clause.predicates.push(format!(
                        "{student} IN (SELECT gl.student_id FROM guardian_links gl \
                         WHERE gl.guardian_id = {p})"
                    ));
                }
                (None, Some(actor)) => {
                    let p = clause.param(BindValue::Id(guardian_id));
                    clause.predicates.push(format!("{actor} = {p}"));
                }
                (None, None) => clause.predicates.push("FALSE".to_string()),
            },
        }

        clause
    }

    fn param(&mut self, value: BindValue) -> String {
        self.binds.push(value);
        format!("${}", self.binds.len())
    }

    /// Add `column <op> $n` when `value` is set.
    pub fn and_eq(mut self, column: &str, value: Option<BindValue>) -> Self {
        if let Some(v) = value {
            let p = self.param(v);
            self.predicates.push(format!("{column} = {p}"));
        }
        self
    }

    /// Add `column >= $n` when `value` is set.
    pub fn and_gte(mut self, column: &str, value: Option<BindValue>) -> Self {
        if let Some(v) = value {
            let p = self.param(v);
            self.predicates.push(format!("{column} >= {p}"));
        }
        self
    }

    /// Add `column <= $n` when `value` is set.
    pub fn and_lte(mut self, column: &str, value: Option<BindValue>) -> Self {
        if let Some(v) = value {
            let p = self.param(v);
            self.predicates.push(format!("{column} <= {p}"));
        }
        self
    }

    /// Add a predicate without parameters.
    pub fn and_raw(mut self, predicate: &str) -> Self {
        self.predicates.push(predicate.to_string());
        self
    }

    /// Append a trailing parameter (e.g. a `LIMIT`) and return its placeholder.
    pub fn trailing(&mut self, value: BindValue) -> String {
        self.param(value)
    }

    /// `WHERE ...` including a leading space, or an empty string.
    pub fn sql(&self) -> String {
        if self.predicates.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.predicates.join(" AND "))
        }
    }

    pub fn binds(&self) -> &[BindValue] {
        &self.binds
    }

    /// Bind every value in placeholder order.
    pub fn bind<'q, O>(
        &'q self,
        mut query: QueryAs<'q, Postgres, O, PgArguments>,
    ) -> QueryAs<'q, Postgres, O, PgArguments> {
        for value in &self.binds {
            query = match value {
                BindValue::Id(v) | BindValue::Int(v) => query.bind(*v),
                BindValue::Text(v) => query.bind(v.as_str()),
                BindValue::Date(v) => query.bind(*v),
                BindValue::Time(v) => query.bind(*v),
            };
        }
        query
    }

    /// [`ScopeClause::bind`] for scalar queries.
    pub fn bind_scalar<'q, O>(
        &'q self,
        mut query: QueryScalar<'q, Postgres, O, PgArguments>,
    ) -> QueryScalar<'q, Postgres, O, PgArguments> {
        for value in &self.binds {
            query = match value {
                BindValue::Id(v) | BindValue::Int(v) => query.bind(*v),
                BindValue::Text(v) => query.bind(v.as_str()),
                BindValue::Date(v) => query.bind(*v),
                BindValue::Time(v) => query.bind(*v),
            };
        }
        query
    }
}

#[cfg(test)]
mod tests {
    use eduscope_core::scope::{resolve, Viewer};

    use super::*;

    const FEES: ScopeColumns = ScopeColumns {
        school: "f.school_id",
        student: Some("f.student_id"),
        actor: None,
    };

    const SCHOOLS: ScopeColumns = ScopeColumns {
        school: "sc.id",
        student: None,
        actor: None,
    };

    fn scope(role: &str, school_id: Option<DbId>, requested: Option<DbId>) -> QueryScope {
        let viewer = Viewer {
            user_id: 9,
            role: role.to_string(),
            school_id,
        };
        resolve(&viewer).unwrap().query_scope(requested).unwrap()
    }

    #[test]
    fn system_scope_without_school_has_no_predicate() {
        let clause = ScopeClause::new(&scope("system_admin", None, None), FEES);
        assert_eq!(clause.sql(), "");
        assert!(clause.binds().is_empty());
    }

    #[test]
    fn system_scope_targeting_a_school() {
        let clause = ScopeClause::new(&scope("system_admin", None, Some(4)), FEES);
        assert_eq!(clause.sql(), " WHERE f.school_id = $1");
        assert_eq!(clause.binds(), &[BindValue::Id(4)]);
    }

    #[test]
    fn school_scope_binds_own_school() {
        let clause = ScopeClause::new(&scope("school_owner", Some(3), None), FEES);
        assert_eq!(clause.sql(), " WHERE f.school_id = $1");
        assert_eq!(clause.binds(), &[BindValue::Id(3)]);
    }

    #[test]
    fn teacher_scope_narrows_through_class_teachers() {
        let clause = ScopeClause::new(&scope("teacher", Some(3), None), FEES);
        let sql = clause.sql();
        assert!(sql.starts_with(" WHERE f.school_id = $1 AND f.student_id IN"));
        assert!(sql.contains("ct.teacher_id = $2"));
        assert_eq!(clause.binds(), &[BindValue::Id(3), BindValue::Id(9)]);
    }

    #[test]
    fn guardian_scope_narrows_through_guardian_links() {
        let clause = ScopeClause::new(&scope("parent", Some(3), None), FEES);
        assert!(clause.sql().contains("gl.guardian_id = $2"));
    }

    #[test]
    fn narrowing_without_columns_fails_closed() {
        let clause = ScopeClause::new(&scope("teacher", Some(3), None), SCHOOLS);
        assert_eq!(clause.sql(), " WHERE sc.id = $1 AND FALSE");
    }

    #[test]
    fn filters_continue_numbering() {
        let mut clause = ScopeClause::new(&scope("principal", Some(3), None), FEES)
            .and_eq("f.term", Some(BindValue::Text("2026-T1".into())))
            .and_gte("f.created_at::date", None)
            .and_lte(
                "f.created_at::date",
                NaiveDate::from_ymd_opt(2026, 3, 31).map(BindValue::Date),
            );
        let limit = clause.trailing(BindValue::Int(50));
        assert_eq!(
            clause.sql(),
            " WHERE f.school_id = $1 AND f.term = $2 AND f.created_at::date <= $3"
        );
        assert_eq!(limit, "$4");
        assert_eq!(clause.binds().len(), 4);
    }
}
