// Project CRUD for the authenticated caller; parts travel nested in the
// request and response bodies.

use axum::extract::{Json, Path, State};
use axum::Extension;
use uuid::Uuid;

use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::models::{ProjectCreate, ProjectUpdate, ProjectView};
use crate::services::{profile_service, project_service};
use crate::AppState;

/// GET /me/projects - ordered projects with their ordered parts
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Vec<ProjectView>> {
    let profile = profile_service::get_or_create_profile(state.store.as_ref(), user.id).await?;
    let projects = project_service::list_projects(state.store.as_ref(), profile.id).await?;
    Ok(ApiResponse::success(projects))
}

/// POST /me/projects - title required; nested parts are bulk-inserted with
/// positional display order when not explicit.
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<ProjectCreate>,
) -> ApiResult<ProjectView> {
    let profile = profile_service::get_or_create_profile(state.store.as_ref(), user.id).await?;
    let project = project_service::create_project(state.store.as_ref(), profile.id, body).await?;
    Ok(ApiResponse::created(project))
}

/// PUT /me/projects/:id - partial update; a supplied `parts` list replaces
/// the whole set, an omitted one leaves it untouched.
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(body): Json<ProjectUpdate>,
) -> ApiResult<ProjectView> {
    let profile = profile_service::get_or_create_profile(state.store.as_ref(), user.id).await?;
    let project =
        project_service::update_project(state.store.as_ref(), profile.id, id, body).await?;
    Ok(ApiResponse::success(project))
}

/// DELETE /me/projects/:id - child parts go first, best-effort
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    let profile = profile_service::get_or_create_profile(state.store.as_ref(), user.id).await?;
    project_service::delete_project(state.store.as_ref(), profile.id, id).await?;
    Ok(ApiResponse::success(serde_json::json!({ "success": true })))
}
