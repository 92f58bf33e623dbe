//! Render states shared by every dashboard view and widget.

use serde::Serialize;

/// What a client should paint for a view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum ViewState<T> {
    /// A refresh is in flight and nothing has been computed yet.
    Loading,
    /// The load exceeded its time bound. The client may keep waiting or retry.
    TimedOut { after_secs: u64 },
    /// Every fetch failed.
    Error { message: String, retryable: bool },
    /// Fetches succeeded but there is nothing to show yet.
    Empty { hint: String },
    /// Data is available. `unavailable` lists sections that failed; when
    /// non-empty the client shows a "data may be incomplete" banner.
    Populated {
        data: T,
        incomplete: bool,
        unavailable: Vec<String>,
    },
}

impl<T> ViewState<T> {
    pub fn partial(data: T, unavailable: Vec<String>) -> Self {
        ViewState::Populated {
            data,
            incomplete: !unavailable.is_empty(),
            unavailable,
        }
    }

    pub fn empty(hint: impl Into<String>) -> Self {
        ViewState::Empty { hint: hint.into() }
    }

    pub fn fetch_error(message: impl Into<String>) -> Self {
        ViewState::Error {
            message: message.into(),
            retryable: true,
        }
    }

    /// Label used in logs and the `state` field of responses.
    pub fn label(&self) -> &'static str {
        match self {
            ViewState::Loading => "loading",
            ViewState::TimedOut { .. } => "timed_out",
            ViewState::Error { .. } => "error",
            ViewState::Empty { .. } => "empty",
            ViewState::Populated { .. } => "populated",
        }
    }
}

/// Empty-state hints, one per section, phrased as the next action to take.
pub mod hints {
    pub const FINANCE: &str = "No fees recorded yet. Create a fee structure to start tracking collections.";
    pub const TRANSACTIONS: &str = "No payments received yet. Recorded payments will appear here.";
    pub const GRADES: &str = "No grades yet. Grades appear once teachers submit assessments.";
    pub const ATTENDANCE: &str = "No attendance taken yet. Mark a register to see attendance trends.";
    pub const ACTIVITY: &str = "No recent activity. Events appear here as people use the system.";
    pub const SYSTEM: &str = "No schools onboarded yet. Add a school to get started.";
    pub const DASHBOARD: &str = "No data yet. Start by adding students, fees or a class register.";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_sets_incomplete_flag() {
        let state = ViewState::partial(1, vec!["grades".into()]);
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["state"], "populated");
        assert_eq!(json["incomplete"], true);
        assert_eq!(json["unavailable"][0], "grades");
    }

    #[test]
    fn partial_without_failures_is_complete() {
        let state = ViewState::partial(1, vec![]);
        assert_eq!(
            state,
            ViewState::Populated {
                data: 1,
                incomplete: false,
                unavailable: Vec::new(),
            }
        );
    }

    #[test]
    fn fetch_errors_are_retryable() {
        let state: ViewState<()> = ViewState::fetch_error("backend unavailable");
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["state"], "error");
        assert_eq!(json["retryable"], true);
        assert_eq!(json["message"], "backend unavailable");
    }

    #[test]
    fn loading_carries_no_payload() {
        let state: ViewState<i32> = ViewState::Loading;
        assert_eq!(serde_json::to_value(&state).unwrap(), serde_json::json!({ "state": "loading" }));
        assert_eq!(state.label(), "loading");
    }
}
