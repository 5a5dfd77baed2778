// Experience CRUD for the authenticated caller. Each handler resolves the
// caller's profile first (provisioning on first access), then scopes every
// store operation by that profile id.

use axum::extract::{Json, Path, State};
use axum::Extension;
use uuid::Uuid;

use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::models::{Experience, ExperienceCreate, ExperienceUpdate};
use crate::services::{experience_service, profile_service};
use crate::AppState;

/// GET /me/experiences - ordered by display order
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Vec<Experience>> {
    let profile = profile_service::get_or_create_profile(state.store.as_ref(), user.id).await?;
    let experiences =
        experience_service::list_experiences(state.store.as_ref(), profile.id).await?;
    Ok(ApiResponse::success(experiences))
}

/// POST /me/experiences - company and title required; display order is
/// auto-assigned when absent.
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<ExperienceCreate>,
) -> ApiResult<Experience> {
    let profile = profile_service::get_or_create_profile(state.store.as_ref(), user.id).await?;
    let experience =
        experience_service::create_experience(state.store.as_ref(), profile.id, body).await?;
    Ok(ApiResponse::created(experience))
}

/// PUT /me/experiences/:id - partial update; 404 outside the caller's scope
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(body): Json<ExperienceUpdate>,
) -> ApiResult<Experience> {
    let profile = profile_service::get_or_create_profile(state.store.as_ref(), user.id).await?;
    let experience =
        experience_service::update_experience(state.store.as_ref(), profile.id, id, body).await?;
    Ok(ApiResponse::success(experience))
}

/// DELETE /me/experiences/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    let profile = profile_service::get_or_create_profile(state.store.as_ref(), user.id).await?;
    experience_service::delete_experience(state.store.as_ref(), profile.id, id).await?;
    Ok(ApiResponse::success(serde_json::json!({ "success": true })))
}
