//! Platform-wide counters for the system overview.
//!
//! Each counter is fetched independently and may be unavailable on its own.
//! Active users and alerts are computed from the analytics-event log over a
//! fixed window; there are no fabricated values.

use serde::Serialize;

use crate::partial::{Completeness, Metric};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemStats {
    pub schools: Metric<i64>,
    pub users: Metric<i64>,
    pub students: Metric<i64>,
    pub active_users: Metric<i64>,
    pub alerts: Metric<i64>,
    /// Window for `active_users` and `alerts`.
    pub window_hours: i64,
}

impl SystemStats {
    fn named(&self) -> [(&'static str, &Metric<i64>); 5] {
        [
            ("schools", &self.schools),
            ("users", &self.users),
            ("students", &self.students),
            ("active_users", &self.active_users),
            ("alerts", &self.alerts),
        ]
    }

    /// Names of counters that could not be fetched.
    pub fn unavailable(&self) -> Vec<&'static str> {
        self.named()
            .into_iter()
            .filter(|(_, m)| !m.is_available())
            .map(|(name, _)| name)
            .collect()
    }

    pub fn completeness(&self) -> Completeness {
        let available = self.named().iter().filter(|(_, m)| m.is_available()).count();
        Completeness::from_counts(available, 5)
    }

    /// No schools onboarded yet.
    pub fn is_empty(&self) -> bool {
        matches!(self.schools, Metric::Available(0))
    }
}
