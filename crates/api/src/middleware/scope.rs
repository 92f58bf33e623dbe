//! Scope-resolving extractor.
//!
//! Wraps [`AuthUser`] and resolves the viewer's scope on every request.
//! Nothing is cached between requests, so a role or school change takes
//! effect on the next call.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use eduscope_core::dashboard::DashboardError;
use eduscope_core::scope::{resolve, ResolvedScope};

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// An authenticated user together with their resolved scope.
///
/// Rejects with 403 when the role is unknown or a school-bound role has no
/// school assignment.
///
/// ```ignore
/// async fn handler(ResolvedViewer(user, scope): ResolvedViewer) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct ResolvedViewer(pub AuthUser, pub ResolvedScope);

impl FromRequestParts<AppState> for ResolvedViewer {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        let resolved = resolve(&user.viewer()).map_err(|e| {
            tracing::warn!(user_id = user.user_id, role = %user.role, error = %e, "Scope resolution failed");
            AppError::Dashboard(DashboardError::Scope(e))
        })?;
        Ok(ResolvedViewer(user, resolved))
    }
}
