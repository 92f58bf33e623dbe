//! Attendance aggregation.
//!
//! Attendance rate is `(present + late) / (total - excused)`; excused
//! absences do not count against a student.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::metrics::{percentage, round2};
use crate::types::DbId;

/// Students below this rate are flagged as chronically absent.
pub const CHRONIC_ABSENCE_RATE: f64 = 80.0;
/// Minimum counted records before a student can be flagged.
pub const CHRONIC_MIN_RECORDS: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    Excused,
}

impl AttendanceStatus {
    /// Parse the `attendance_records.status` column. Unknown values count
    /// as absent.
    pub fn from_db(value: &str) -> Self {
        match value {
            "present" => AttendanceStatus::Present,
            "late" => AttendanceStatus::Late,
            "excused" => AttendanceStatus::Excused,
            _ => AttendanceStatus::Absent,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceRecord {
    pub student_id: DbId,
    pub student_name: String,
    pub class_id: DbId,
    pub class_name: String,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Tally {
    attended: u64,
    counted: u64,
}

impl Tally {
    fn add(&mut self, status: AttendanceStatus) {
        match status {
            AttendanceStatus::Present | AttendanceStatus::Late => {
                self.attended += 1;
                self.counted += 1;
            }
            AttendanceStatus::Absent => self.counted += 1,
            AttendanceStatus::Excused => {}
        }
    }

    fn rate(&self) -> f64 {
        round2(percentage(self.attended as f64, self.counted as f64))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassAttendance {
    pub class_id: DbId,
    pub class_name: String,
    pub rate: f64,
    pub records: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyAttendance {
    pub date: NaiveDate,
    pub rate: f64,
    pub records: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Absentee {
    pub student_id: DbId,
    pub student_name: String,
    pub rate: f64,
    pub records: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceSummary {
    pub total_records: u64,
    pub present: u64,
    pub absent: u64,
    pub late: u64,
    pub excused: u64,
    pub attendance_rate: f64,
    pub by_class: Vec<ClassAttendance>,
    pub daily: Vec<DailyAttendance>,
    pub chronic_absentees: Vec<Absentee>,
}

impl AttendanceSummary {
    pub fn is_empty(&self) -> bool {
        self.total_records == 0
    }
}

/// Fold attendance rows into an [`AttendanceSummary`]. Classes are ordered by
/// id, days ascending, absentees by rate ascending.
pub fn summarize_attendance(records: &[AttendanceRecord]) -> AttendanceSummary {
    let mut overall = Tally::default();
    let (mut present, mut absent, mut late, mut excused) = (0u64, 0u64, 0u64, 0u64);
    let mut by_class: BTreeMap<DbId, (String, Tally, u64)> = BTreeMap::new();
    let mut by_day: BTreeMap<NaiveDate, (Tally, u64)> = BTreeMap::new();
    let mut by_student: BTreeMap<DbId, (String, Tally)> = BTreeMap::new();

    for r in records {
        match r.status {
            AttendanceStatus::Present => present += 1,
            AttendanceStatus::Absent => absent += 1,
            AttendanceStatus::Late => late += 1,
            AttendanceStatus::Excused => excused += 1,
        }
        overall.add(r.status);

        let class = by_class
            .entry(r.class_id)
            .or_insert_with(|| (r.class_name.clone(), Tally::default(), 0));
        class.1.add(r.status);
        class.2 += 1;

        let day = by_day.entry(r.date).or_default();
        day.0.add(r.status);
        day.1 += 1;

        by_student
            .entry(r.student_id)
            .or_insert_with(|| (r.student_name.clone(), Tally::default()))
            .1
            .add(r.status);
    }

    let mut chronic: Vec<Absentee> = by_student
        .into_iter()
        .filter(|(_, (_, t))| t.counted >= CHRONIC_MIN_RECORDS && t.rate() < CHRONIC_ABSENCE_RATE)
        .map(|(student_id, (student_name, t))| Absentee {
            student_id,
            student_name,
            rate: t.rate(),
            records: t.counted,
        })
        .collect();
    chronic.sort_by(|a, b| a.rate.total_cmp(&b.rate).then(a.student_id.cmp(&b.student_id)));

    AttendanceSummary {
        total_records: records.len() as u64,
        present,
        absent,
        late,
        excused,
        attendance_rate: overall.rate(),
        by_class: by_class
            .into_iter()
            .map(|(class_id, (class_name, t, n))| ClassAttendance {
                class_id,
                class_name,
                rate: t.rate(),
                records: n,
            })
            .collect(),
        daily: by_day
            .into_iter()
            .map(|(date, (t, n))| DailyAttendance {
                date,
                rate: t.rate(),
                records: n,
            })
            .collect(),
        chronic_absentees: chronic,
    }
}
