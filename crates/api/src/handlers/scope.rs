//! Handler exposing the caller's resolved scope.

use axum::Json;
use eduscope_core::router::{route, DashboardView, Section};
use eduscope_core::scope::{ResolvedScope, Scope};
use serde::Serialize;

use crate::error::AppResult;
use crate::middleware::scope::ResolvedViewer;
use crate::response::DataResponse;

/// A section of the caller's view and the scope it requires.
#[derive(Debug, Serialize)]
pub struct SectionAccess {
    pub section: Section,
    pub required_scope: Scope,
}

#[derive(Debug, Serialize)]
pub struct MyScope {
    #[serde(flatten)]
    pub resolved: ResolvedScope,
    pub view: DashboardView,
    pub sections: Vec<SectionAccess>,
}

/// GET /me/scope
///
/// Returns the caller's resolved scope and the sections their dashboard
/// composes. A school-bound role without a school gets 403
/// `ASSIGNMENT_REQUIRED` instead.
pub async fn my_scope(
    ResolvedViewer(user, resolved): ResolvedViewer,
) -> AppResult<Json<DataResponse<MyScope>>> {
    let view = route(&user.role);
    let sections = view
        .sections()
        .into_iter()
        .map(|section| SectionAccess {
            section,
            required_scope: section.required_scope(),
        })
        .collect();

    Ok(Json(DataResponse {
        data: MyScope {
            resolved,
            view,
            sections,
        },
    }))
}
