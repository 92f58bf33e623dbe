//! Partial results for fan-out fetches.
//!
//! When several sub-queries run in parallel, each one settles independently
//! into a [`Metric`]. A failed sub-query becomes [`Metric::Unavailable`]
//! instead of failing the whole view.

use serde::Serialize;

/// One independently fetched value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "value")]
pub enum Metric<T> {
    Available(T),
    Unavailable { reason: String },
}

impl<T> Metric<T> {
    pub fn is_available(&self) -> bool {
        matches!(self, Metric::Available(_))
    }
}

impl<T, E: std::fmt::Display> From<Result<T, E>> for Metric<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(v) => Metric::Available(v),
            Err(e) => Metric::Unavailable {
                reason: e.to_string(),
            },
        }
    }
}

/// How many of a set of settled metrics succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Completeness {
    Complete,
    Partial,
    Failed,
}

impl Completeness {
    /// Classify from `(available, total)` counts. An empty set is complete.
    pub fn from_counts(available: usize, total: usize) -> Self {
        if available == total {
            Completeness::Complete
        } else if available == 0 {
            Completeness::Failed
        } else {
            Completeness::Partial
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_converts_into_metric() {
        let ok: Metric<i64> = Ok::<_, String>(3).into();
        assert_eq!(ok, Metric::Available(3));

        let err: Metric<i64> = Err::<i64, _>("connection reset").into();
        assert_eq!(
            err,
            Metric::Unavailable {
                reason: "connection reset".into()
            }
        );
    }

    #[test]
    fn completeness_classification() {
        assert_eq!(Completeness::from_counts(2, 2), Completeness::Complete);
        assert_eq!(Completeness::from_counts(1, 2), Completeness::Partial);
        assert_eq!(Completeness::from_counts(0, 2), Completeness::Failed);
        assert_eq!(Completeness::from_counts(0, 0), Completeness::Complete);
    }

    #[test]
    fn unavailable_serializes_with_reason() {
        let m: Metric<i64> = Metric::Unavailable {
            reason: "timeout".into(),
        };
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["status"], "unavailable");
        assert_eq!(json["value"]["reason"], "timeout");
    }
}
