//! Tests for `AppError` → HTTP response mapping.
//!
//! These call `IntoResponse` directly on `AppError` values; no server or
//! data source is involved.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use eduscope_api::error::AppError;
use eduscope_core::dashboard::DashboardError;
use eduscope_core::error::CoreError;
use eduscope_core::guard::guard;
use eduscope_core::roles::Role;
use eduscope_core::scope::{Scope, ScopeError};
use http_body_util::BodyExt;

/// Helper: convert an `AppError` into its status code and parsed JSON body.
async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

// ---------------------------------------------------------------------------
// Test: unknown role maps to 403 ACCESS_DENIED naming the role
// ---------------------------------------------------------------------------

#[tokio::test]
async fn access_denied_names_the_role() {
    let err = AppError::Dashboard(DashboardError::AccessDenied {
        role: "unknown_role".into(),
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "ACCESS_DENIED");
    assert_eq!(json["error"], "Access denied for role 'unknown_role'");
    assert_eq!(json["details"]["role"], "unknown_role");
}

// ---------------------------------------------------------------------------
// Test: missing school maps to 403 ASSIGNMENT_REQUIRED
// ---------------------------------------------------------------------------

#[tokio::test]
async fn assignment_required_returns_403() {
    let err = AppError::Dashboard(DashboardError::Scope(ScopeError::AssignmentRequired {
        role: Role::Teacher,
    }));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "ASSIGNMENT_REQUIRED");
    assert!(json["error"]
        .as_str()
        .unwrap()
        .starts_with("School assignment required"));
}

// ---------------------------------------------------------------------------
// Test: guard denial carries both scope levels
// ---------------------------------------------------------------------------

#[tokio::test]
async fn guard_denial_returns_scope_details() {
    let denial = guard(Scope::System, Scope::School)
        .into_result()
        .unwrap_err();
    let err = AppError::Dashboard(DashboardError::Denied(denial));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "SCOPE_DENIED");
    assert_eq!(json["details"]["required"], "system");
    assert_eq!(json["details"]["actual"], "school");
}

// ---------------------------------------------------------------------------
// Test: foreign school maps to 403 SCOPE_DENIED
// ---------------------------------------------------------------------------

#[tokio::test]
async fn out_of_scope_school_returns_403() {
    let err = AppError::Dashboard(DashboardError::Scope(ScopeError::SchoolOutOfScope {
        requested: 9,
    }));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "SCOPE_DENIED");
    assert_eq!(json["details"]["requested_school"], 9);
}

// ---------------------------------------------------------------------------
// Test: superseded load maps to 409
// ---------------------------------------------------------------------------

#[tokio::test]
async fn superseded_returns_409() {
    let (status, json) = error_to_response(AppError::Dashboard(DashboardError::Superseded)).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "SUPERSEDED");
}

// ---------------------------------------------------------------------------
// Test: fetch failure and timeout are retryable
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_failed_returns_503_retryable() {
    let err = AppError::FetchFailed {
        message: "Unable to load dashboard data".into(),
    };

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["code"], "FETCH_FAILED");
    assert_eq!(json["error"], "Unable to load dashboard data");
    assert_eq!(json["retryable"], true);
}

#[tokio::test]
async fn loading_timeout_returns_504_retryable() {
    let (status, json) = error_to_response(AppError::LoadingTimeout { after_secs: 15 }).await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(json["code"], "LOADING_TIMEOUT");
    assert_eq!(json["retryable"], true);
}

// ---------------------------------------------------------------------------
// Test: invalid filter maps to 400 VALIDATION_ERROR
// ---------------------------------------------------------------------------

#[tokio::test]
async fn invalid_filter_returns_400() {
    let err = AppError::Dashboard(DashboardError::InvalidFilter("'from' after 'to'".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert!(json.get("retryable").is_none());
}

// ---------------------------------------------------------------------------
// Test: CoreError::Unauthorized maps to 401
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unauthorized_error_returns_401() {
    let err = AppError::Core(CoreError::Unauthorized("Missing Authorization header".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "UNAUTHORIZED");
}
