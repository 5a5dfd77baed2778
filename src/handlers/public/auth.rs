// Public auth handlers: registration, login and the password-reset pair.
// All credential work is delegated to the external auth service; these
// handlers only validate input shape and translate outcomes.

use std::collections::HashMap;

use axum::extract::{Json, State};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::profile_service;
use crate::store::AuthUserInfo;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResetRequestBody {
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordBody {
    pub access_token: Option<String>,
    pub new_password: Option<String>,
}

#[derive(Debug, serde::Serialize)]
pub struct SessionResponse {
    pub token: Option<String>,
    pub user: AuthUserInfo,
}

/// POST /auth/register - create an account and open a session
///
/// When the store requires email confirmation the response carries a null
/// token; the caller signs in after confirming. A session that should exist
/// but does not is a 500. Profile provisioning after registration is
/// best-effort: failure is logged and the registration still succeeds.
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<CredentialsRequest>,
) -> ApiResult<SessionResponse> {
    let (email, password) = required_credentials(&body)?;

    let session = state.auth.sign_up(&email, &password).await?;

    match session.access_token {
        Some(token) => {
            if let Err(err) =
                profile_service::get_or_create_profile(state.store.as_ref(), session.user.id).await
            {
                tracing::warn!(user_id = %session.user.id, "post-registration profile provisioning failed: {}", err);
            }
            Ok(ApiResponse::success(SessionResponse { token: Some(token), user: session.user }))
        }
        None if session.confirmation_pending => {
            Ok(ApiResponse::success(SessionResponse { token: None, user: session.user }))
        }
        None => Err(ApiError::internal_server_error("Session could not be established")),
    }
}

/// POST /auth/login - authenticate and receive a bearer token
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<CredentialsRequest>,
) -> ApiResult<SessionResponse> {
    let (email, password) = required_credentials(&body)?;

    let session = state.auth.sign_in(&email, &password).await?;
    let token = session
        .access_token
        .ok_or_else(|| ApiError::internal_server_error("Session could not be established"))?;

    Ok(ApiResponse::success(SessionResponse { token: Some(token), user: session.user }))
}

/// POST /auth/reset-password-request - trigger a reset email
///
/// Always reports success, whether or not the address is known and whether
/// or not the upstream dispatch worked, so the endpoint cannot be used to
/// enumerate accounts.
pub async fn reset_password_request(
    State(state): State<AppState>,
    Json(body): Json<ResetRequestBody>,
) -> ApiResult<Value> {
    if let Some(email) = body.email.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
        let redirect = state.password_reset_redirect.as_deref();
        if let Err(err) = state.auth.request_password_reset(email, redirect).await {
            tracing::warn!("password reset request failed upstream: {}", err);
        }
    }

    Ok(ApiResponse::success(json!({ "success": true })))
}

/// POST /auth/reset-password - set a new password using a recovery token
pub async fn reset_password(
    State(state): State<AppState>,
    Json(body): Json<ResetPasswordBody>,
) -> ApiResult<Value> {
    let mut field_errors = HashMap::new();
    if body.access_token.as_deref().unwrap_or("").trim().is_empty() {
        field_errors.insert("access_token".to_string(), "This field is required".to_string());
    }
    if body.new_password.as_deref().unwrap_or("").is_empty() {
        field_errors.insert("new_password".to_string(), "This field is required".to_string());
    }
    if !field_errors.is_empty() {
        return Err(ApiError::validation_error("Missing required fields", Some(field_errors)));
    }

    let access_token = body.access_token.unwrap_or_default();
    let new_password = body.new_password.unwrap_or_default();
    state.auth.update_password(&access_token, &new_password).await?;

    Ok(ApiResponse::success(json!({ "success": true })))
}

fn required_credentials(body: &CredentialsRequest) -> Result<(String, String), ApiError> {
    let mut field_errors = HashMap::new();
    if body.email.as_deref().unwrap_or("").trim().is_empty() {
        field_errors.insert("email".to_string(), "This field is required".to_string());
    }
    if body.password.as_deref().unwrap_or("").is_empty() {
        field_errors.insert("password".to_string(), "This field is required".to_string());
    }
    if !field_errors.is_empty() {
        return Err(ApiError::validation_error("Missing required fields", Some(field_errors)));
    }

    Ok((
        body.email.clone().unwrap_or_default().trim().to_string(),
        body.password.clone().unwrap_or_default(),
    ))
}
