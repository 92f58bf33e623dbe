pub mod dashboard;
pub mod health;

use std::time::Duration;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, HeaderValue, Method, StatusCode};
use axum::routing::get;
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::ServerConfig;
use crate::handlers;
use crate::state::AppState;

const REQUEST_ID: &str = "x-request-id";

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /me/scope                                        resolved scope of the caller
///
/// /dashboard                                       role-routed dashboard
/// /dashboard/widgets/finance                       fee summary (school)
/// /dashboard/widgets/transactions                  revenue summary (school)
/// /dashboard/widgets/grades                        grade summary (student)
/// /dashboard/widgets/attendance                    attendance summary (student)
/// /dashboard/widgets/activity                      analytics-event feed (school)
/// /dashboard/widgets/system-stats                  platform counters (system)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/me/scope", get(handlers::scope::my_scope))
        .nest("/dashboard", dashboard::router())
}

/// The full application: `/health` at the root, the API under `/api/v1`,
/// and the middleware stack (applied bottom-up).
pub fn app(state: AppState, config: &ServerConfig) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID);

    Router::new()
        .merge(health::router())
        .nest("/api/v1", api_routes())
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs),
        ))
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .layer(cors(&config.cors_origins))
        .with_state(state)
}

/// Read-only CORS for the dashboard front-ends. Origins that are not valid
/// header values are skipped.
fn cors(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(origin = %origin, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_origins_are_skipped() {
        // Building the layer must not panic on a bad origin.
        let _ = cors(&["http://localhost:5173".to_string(), "bad\norigin".to_string()]);
    }
}
