//! Fee and transaction rows.

use eduscope_core::aggregation::finance::{
    FeeRecord, FeeStatus, TransactionKind, TransactionRecord,
};
use eduscope_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from `fees` joined with the student's name.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FeeRow {
    pub id: DbId,
    pub school_id: DbId,
    pub student_id: DbId,
    pub student_name: String,
    pub amount: f64,
    pub paid_amount: f64,
    pub status: String,
    pub created_at: Timestamp,
}

impl From<FeeRow> for FeeRecord {
    fn from(row: FeeRow) -> Self {
        FeeRecord {
            id: row.id,
            school_id: row.school_id,
            student_id: row.student_id,
            student_name: row.student_name,
            amount: row.amount,
            paid_amount: row.paid_amount,
            status: FeeStatus::from_db(&row.status),
            created_at: row.created_at,
        }
    }
}

/// A row from `transactions`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TransactionRow {
    pub id: DbId,
    pub school_id: DbId,
    pub student_id: Option<DbId>,
    pub amount: f64,
    pub method: String,
    pub kind: String,
    pub occurred_at: Timestamp,
}

impl From<TransactionRow> for TransactionRecord {
    fn from(row: TransactionRow) -> Self {
        TransactionRecord {
            id: row.id,
            school_id: row.school_id,
            student_id: row.student_id,
            amount: row.amount,
            method: row.method,
            kind: match row.kind.as_str() {
                "refund" => TransactionKind::Refund,
                _ => TransactionKind::Payment,
            },
            occurred_at: row.occurred_at,
        }
    }
}
