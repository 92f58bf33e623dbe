//! Grade and attendance rows.

use chrono::NaiveDate;
use eduscope_core::aggregation::attendance::{AttendanceRecord, AttendanceStatus};
use eduscope_core::aggregation::grades::{GradeRecord, GradeStatus};
use eduscope_core::types::DbId;
use serde::Serialize;
use sqlx::FromRow;

/// A row from `grades` joined with student and subject names.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct GradeRow {
    pub student_id: DbId,
    pub student_name: String,
    pub subject_id: DbId,
    pub subject_name: String,
    pub class_id: DbId,
    pub percentage: Option<f64>,
    pub letter_grade: Option<String>,
    pub status: String,
    pub term: String,
}

impl From<GradeRow> for GradeRecord {
    fn from(row: GradeRow) -> Self {
        GradeRecord {
            student_id: row.student_id,
            student_name: row.student_name,
            subject_id: row.subject_id,
            subject_name: row.subject_name,
            class_id: row.class_id,
            percentage: row.percentage,
            letter_grade: row.letter_grade,
            status: GradeStatus::from_db(&row.status),
            term: row.term,
        }
    }
}

/// A row from `attendance_records` joined with student and class names.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AttendanceRow {
    pub student_id: DbId,
    pub student_name: String,
    pub class_id: DbId,
    pub class_name: String,
    pub date: NaiveDate,
    pub status: String,
}

impl From<AttendanceRow> for AttendanceRecord {
    fn from(row: AttendanceRow) -> Self {
        AttendanceRecord {
            student_id: row.student_id,
            student_name: row.student_name,
            class_id: row.class_id,
            class_name: row.class_name,
            date: row.date,
            status: AttendanceStatus::from_db(&row.status),
        }
    }
}
