//! Handlers for the role-routed analytics dashboard.
//!
//! Every endpoint requires authentication via [`AuthUser`]. Scope resolution
//! and the per-section guard run inside the composer on each request, before
//! any data is fetched.

use axum::extract::{Query, State};
use axum::Json;
use eduscope_core::dashboard::{DashboardReport, DashboardRequest, WidgetReport};
use eduscope_core::router::Section;
use eduscope_core::source::RecordFilter;
use eduscope_core::types::{DbId, Timestamp};
use eduscope_core::view::ViewState;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

/// Query params shared by `GET /dashboard` and every widget endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    /// Target school. Only system viewers may leave this unset or pick a
    /// school other than their own.
    pub school_id: Option<DbId>,
    pub term: Option<String>,
    pub from: Option<chrono::NaiveDate>,
    pub to: Option<chrono::NaiveDate>,
    pub class_id: Option<DbId>,
    /// Activity window in hours (default from config, clamped to 1..=720).
    pub window_hours: Option<i64>,
    /// Anchor for relative windows. Defaults to now.
    pub as_of: Option<Timestamp>,
    /// Widgets only: read without superseding a load already in flight.
    #[serde(default)]
    pub poll: bool,
}

impl DashboardQuery {
    fn into_request(self, user: &AuthUser) -> DashboardRequest {
        DashboardRequest {
            viewer: user.viewer(),
            school_id: self.school_id,
            filter: RecordFilter {
                term: self.term,
                from: self.from,
                to: self.to,
                class_id: self.class_id,
            },
            window_hours: self.window_hours,
            as_of: self.as_of,
        }
    }
}

/// Turn non-renderable states into error responses.
///
/// `Error` becomes 503 and `TimedOut` becomes 504, both retryable. Populated
/// (including partial), empty and loading states pass through.
fn ensure_renderable<T>(state: &ViewState<T>) -> AppResult<()> {
    match state {
        ViewState::Error { message, .. } => Err(AppError::FetchFailed {
            message: message.clone(),
        }),
        ViewState::TimedOut { after_secs } => Err(AppError::LoadingTimeout {
            after_secs: *after_secs,
        }),
        _ => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Full dashboard
// ---------------------------------------------------------------------------

/// GET /dashboard
///
/// Routes the viewer's role to a view and composes all of its sections.
pub async fn get_dashboard(
    user: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<DashboardQuery>,
) -> AppResult<Json<DataResponse<DashboardReport>>> {
    let request = params.into_request(&user);
    let report = state.composer.load_dashboard(&request).await?;
    ensure_renderable(&report.state)?;
    Ok(Json(DataResponse { data: report }))
}

// ---------------------------------------------------------------------------
// Widgets
// ---------------------------------------------------------------------------

async fn load_widget(
    user: AuthUser,
    state: AppState,
    params: DashboardQuery,
    section: Section,
) -> AppResult<Json<DataResponse<WidgetReport>>> {
    let poll = params.poll;
    let request = params.into_request(&user);
    let report = if poll {
        state.composer.poll_section(&request, section).await?
    } else {
        state.composer.load_section(&request, section).await?
    };
    ensure_renderable(&report.state)?;
    Ok(Json(DataResponse { data: report }))
}

/// GET /dashboard/widgets/finance
pub async fn finance(
    user: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<DashboardQuery>,
) -> AppResult<Json<DataResponse<WidgetReport>>> {
    load_widget(user, state, params, Section::Finance).await
}

/// GET /dashboard/widgets/transactions
pub async fn transactions(
    user: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<DashboardQuery>,
) -> AppResult<Json<DataResponse<WidgetReport>>> {
    load_widget(user, state, params, Section::Transactions).await
}

/// GET /dashboard/widgets/grades
///
/// Guardians only see released grades.
pub async fn grades(
    user: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<DashboardQuery>,
) -> AppResult<Json<DataResponse<WidgetReport>>> {
    load_widget(user, state, params, Section::Grades).await
}

/// GET /dashboard/widgets/attendance
pub async fn attendance(
    user: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<DashboardQuery>,
) -> AppResult<Json<DataResponse<WidgetReport>>> {
    load_widget(user, state, params, Section::Attendance).await
}

/// GET /dashboard/widgets/activity
pub async fn activity(
    user: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<DashboardQuery>,
) -> AppResult<Json<DataResponse<WidgetReport>>> {
    load_widget(user, state, params, Section::Activity).await
}

/// GET /dashboard/widgets/system-stats
pub async fn system_stats(
    user: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<DashboardQuery>,
) -> AppResult<Json<DataResponse<WidgetReport>>> {
    load_widget(user, state, params, Section::SystemStats).await
}
