use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use eduscope_core::dashboard::DashboardError;
use eduscope_core::error::CoreError;
use eduscope_core::scope::ScopeError;
use serde_json::{json, Value};

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] and [`DashboardError`] and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `eduscope_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Routing, scope or guard refusal from the dashboard composer.
    #[error(transparent)]
    Dashboard(#[from] DashboardError),

    /// Every fetch behind a view failed. The client may retry.
    #[error("Fetch failed: {message}")]
    FetchFailed { message: String },

    /// A view did not finish within its time bound.
    #[error("Loading timed out after {after_secs}s")]
    LoadingTimeout { after_secs: u64 },
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

/// Everything needed to render an error body.
struct ErrorParts {
    status: StatusCode,
    code: &'static str,
    message: String,
    details: Option<Value>,
    retryable: bool,
}

impl ErrorParts {
    fn new(status: StatusCode, code: &'static str, message: String) -> Self {
        Self {
            status,
            code,
            message,
            details: None,
            retryable: false,
        }
    }

    fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    fn retryable(mut self) -> Self {
        self.retryable = true;
        self
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let parts = match &self {
            // --- CoreError variants ---
            AppError::Core(CoreError::Unauthorized(msg)) => {
                ErrorParts::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
            }

            // --- Dashboard errors ---
            AppError::Dashboard(err) => classify_dashboard_error(err),

            // --- HTTP-specific errors ---
            AppError::FetchFailed { message } => {
                ErrorParts::new(StatusCode::SERVICE_UNAVAILABLE, "FETCH_FAILED", message.clone())
                    .retryable()
            }
            AppError::LoadingTimeout { after_secs } => ErrorParts::new(
                StatusCode::GATEWAY_TIMEOUT,
                "LOADING_TIMEOUT",
                format!("Loading is taking longer than expected ({after_secs}s)"),
            )
            .retryable(),
        };

        let mut body = json!({
            "error": parts.message,
            "code": parts.code,
        });
        if let Some(details) = parts.details {
            body["details"] = details;
        }
        if parts.retryable {
            body["retryable"] = json!(true);
        }

        (parts.status, axum::Json(body)).into_response()
    }
}

/// Map a composer refusal to a status and error code.
///
/// - Unknown roles map to 403 `ACCESS_DENIED` naming the literal role.
/// - A school-bound role without a school maps to 403 `ASSIGNMENT_REQUIRED`.
/// - Out-of-scope schools and guard denials map to 403 `SCOPE_DENIED`.
/// - A newer load from the same viewer maps to 409 `SUPERSEDED`.
fn classify_dashboard_error(err: &DashboardError) -> ErrorParts {
    match err {
        DashboardError::AccessDenied { role } => {
            ErrorParts::new(StatusCode::FORBIDDEN, "ACCESS_DENIED", err.to_string())
                .with_details(json!({ "role": role }))
        }
        DashboardError::Scope(scope) => match scope {
            ScopeError::UnknownRole(role) => {
                ErrorParts::new(StatusCode::FORBIDDEN, "ACCESS_DENIED", scope.to_string())
                    .with_details(json!({ "role": role }))
            }
            ScopeError::AssignmentRequired { .. } => {
                ErrorParts::new(StatusCode::FORBIDDEN, "ASSIGNMENT_REQUIRED", scope.to_string())
            }
            ScopeError::SchoolOutOfScope { requested } => {
                ErrorParts::new(StatusCode::FORBIDDEN, "SCOPE_DENIED", scope.to_string())
                    .with_details(json!({ "requested_school": requested }))
            }
        },
        DashboardError::Denied(denial) => {
            ErrorParts::new(StatusCode::FORBIDDEN, "SCOPE_DENIED", denial.reason.clone())
                .with_details(json!({
                    "required": denial.required,
                    "actual": denial.actual,
                }))
        }
        DashboardError::InvalidFilter(msg) => {
            ErrorParts::new(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
        }
        DashboardError::Superseded => {
            ErrorParts::new(StatusCode::CONFLICT, "SUPERSEDED", err.to_string())
        }
    }
}
