//! Route definitions for the analytics dashboard.
//!
//! All endpoints require authentication.

use axum::routing::get;
use axum::Router;

use crate::handlers::dashboard;
use crate::state::AppState;

/// Dashboard routes mounted at `/dashboard`.
///
/// ```text
/// GET  /                              -> get_dashboard
/// GET  /widgets/finance               -> finance
/// GET  /widgets/transactions          -> transactions
/// GET  /widgets/grades                -> grades
/// GET  /widgets/attendance            -> attendance
/// GET  /widgets/activity              -> activity
/// GET  /widgets/system-stats          -> system_stats
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::get_dashboard))
        .route("/widgets/finance", get(dashboard::finance))
        .route("/widgets/transactions", get(dashboard::transactions))
        .route("/widgets/grades", get(dashboard::grades))
        .route("/widgets/attendance", get(dashboard::attendance))
        .route("/widgets/activity", get(dashboard::activity))
        .route("/widgets/system-stats", get(dashboard::system_stats))
}
