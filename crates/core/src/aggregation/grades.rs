//! Grade aggregation.
//!
//! Rows with only a letter or competency level (no percentage) are counted in
//! the workflow totals but excluded from numeric averages and bands.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::metrics::{clamp_percentage, mean, percentage, round2};
use crate::types::DbId;

/// Minimum percentage counted as a pass.
pub const PASS_MARK: f64 = 50.0;
/// Number of students listed in the top and bottom lists.
pub const RANKED_STUDENTS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradeStatus {
    Draft,
    Submitted,
    Approved,
    Rejected,
    Released,
}

impl GradeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            GradeStatus::Draft => "draft",
            GradeStatus::Submitted => "submitted",
            GradeStatus::Approved => "approved",
            GradeStatus::Rejected => "rejected",
            GradeStatus::Released => "released",
        }
    }

    /// Parse the `grades.status` column. Unknown values are treated as draft.
    pub fn from_db(value: &str) -> Self {
        match value {
            "submitted" => GradeStatus::Submitted,
            "approved" => GradeStatus::Approved,
            "rejected" => GradeStatus::Rejected,
            "released" => GradeStatus::Released,
            _ => GradeStatus::Draft,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GradeRecord {
    pub student_id: DbId,
    pub student_name: String,
    pub subject_id: DbId,
    pub subject_name: String,
    pub class_id: DbId,
    pub percentage: Option<f64>,
    pub letter_grade: Option<String>,
    pub status: GradeStatus,
    pub term: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GradeBands {
    /// 80 and above.
    pub a: u64,
    /// 70 to 79.
    pub b: u64,
    /// 60 to 69.
    pub c: u64,
    /// 50 to 59.
    pub d: u64,
    /// Below 50.
    pub e: u64,
}

impl GradeBands {
    fn add(&mut self, pct: f64) {
        match pct {
            p if p >= 80.0 => self.a += 1,
            p if p >= 70.0 => self.b += 1,
            p if p >= 60.0 => self.c += 1,
            p if p >= PASS_MARK => self.d += 1,
            _ => self.e += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectAverage {
    pub subject_id: DbId,
    pub subject_name: String,
    pub average: f64,
    pub graded: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentAverage {
    pub student_id: DbId,
    pub student_name: String,
    pub average: f64,
    pub graded: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeSummary {
    pub total_records: u64,
    pub graded: u64,
    pub letter_only: u64,
    pub average: Option<f64>,
    pub pass_rate: f64,
    pub bands: GradeBands,
    pub status_counts: BTreeMap<GradeStatus, u64>,
    pub subject_averages: Vec<SubjectAverage>,
    pub top_students: Vec<StudentAverage>,
    pub bottom_students: Vec<StudentAverage>,
}

impl GradeSummary {
    pub fn is_empty(&self) -> bool {
        self.total_records == 0
    }
}

/// Fold grade rows into a [`GradeSummary`].
pub fn summarize_grades(grades: &[GradeRecord]) -> GradeSummary {
    let mut status_counts: BTreeMap<GradeStatus, u64> = BTreeMap::new();
    let mut bands = GradeBands::default();
    let mut scores: Vec<f64> = Vec::new();
    let mut letter_only = 0u64;
    let mut passed = 0u64;
    let mut by_subject: BTreeMap<DbId, (String, Vec<f64>)> = BTreeMap::new();
    let mut by_student: BTreeMap<DbId, (String, Vec<f64>)> = BTreeMap::new();

    for grade in grades {
        *status_counts.entry(grade.status).or_default() += 1;

        let Some(raw) = grade.percentage else {
            letter_only += 1;
            continue;
        };
        let pct = clamp_percentage(raw);
        scores.push(pct);
        bands.add(pct);
        if pct >= PASS_MARK {
            passed += 1;
        }
        by_subject
            .entry(grade.subject_id)
            .or_insert_with(|| (grade.subject_name.clone(), Vec::new()))
            .1
            .push(pct);
        by_student
            .entry(grade.student_id)
            .or_insert_with(|| (grade.student_name.clone(), Vec::new()))
            .1
            .push(pct);
    }

    let subject_averages = by_subject
        .into_iter()
        .map(|(subject_id, (subject_name, s))| SubjectAverage {
            subject_id,
            subject_name,
            average: round2(mean(&s).unwrap_or(0.0)),
            graded: s.len() as u64,
        })
        .collect();

    let mut students: Vec<StudentAverage> = by_student
        .into_iter()
        .map(|(student_id, (student_name, s))| StudentAverage {
            student_id,
            student_name,
            average: round2(mean(&s).unwrap_or(0.0)),
            graded: s.len() as u64,
        })
        .collect();
    students.sort_by(|a, b| {
        b.average
            .total_cmp(&a.average)
            .then(a.student_id.cmp(&b.student_id))
    });

    let top_students: Vec<StudentAverage> =
        students.iter().take(RANKED_STUDENTS).cloned().collect();
    let bottom_students: Vec<StudentAverage> = students
        .iter()
        .rev()
        .take(RANKED_STUDENTS)
        .cloned()
        .collect();

    let graded = scores.len() as u64;
    GradeSummary {
        total_records: grades.len() as u64,
        graded,
        letter_only,
        average: mean(&scores).map(round2),
        pass_rate: round2(percentage(passed as f64, graded as f64)),
        bands,
        status_counts,
        subject_averages,
        top_students,
        bottom_students,
    }
}
