use axum::Extension;
use serde_json::{json, Value};

use crate::middleware::{ApiResponse, ApiResult, AuthUser};

/// POST /auth/logout - end the caller's session
///
/// Stateless by design: the credential was already re-validated by the auth
/// guard, and no session state lives in this process. The caller discards
/// its token.
pub async fn logout(Extension(user): Extension<AuthUser>) -> ApiResult<Value> {
    tracing::debug!(user_id = %user.id, "logout");
    Ok(ApiResponse::success(json!({ "success": true })))
}
