use axum::extract::{Json, State};
use axum::Extension;

use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::models::{Profile, ProfileUpdate};
use crate::services::profile_service;
use crate::AppState;

/// PUT /me/profile - partial update of the caller's profile. Omitted fields
/// are left unmodified.
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<ProfileUpdate>,
) -> ApiResult<Profile> {
    // First access may arrive through this route; provision before patching.
    profile_service::get_or_create_profile(state.store.as_ref(), user.id).await?;
    let profile = profile_service::update_profile(state.store.as_ref(), user.id, body).await?;
    Ok(ApiResponse::success(profile))
}
