use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::error::ApiError;
use crate::store::AuthError;
use crate::AppState;

/// Authenticated principal resolved by the external auth service and
/// attached to the request extensions for downstream handlers.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: Option<String>,
}

/// Bearer-token middleware for protected routes. A missing or malformed
/// header fails immediately without contacting the store; otherwise the
/// token is presented to the auth service on every request - no local
/// validation, caching, or revocation.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(request.headers()).map_err(ApiError::unauthorized)?;

    let user = state.auth.get_user(&token).await.map_err(|err| match err {
        AuthError::InvalidToken => ApiError::unauthorized("Invalid or expired token"),
        other => other.into(),
    })?;

    request.extensions_mut().insert(AuthUser { id: user.id, email: user.email });

    Ok(next.run(request).await)
}

/// Extract the bearer credential from the Authorization header
fn extract_bearer_token(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get("authorization")
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty bearer token".to_string());
        }
        Ok(token.to_string())
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn missing_header_is_rejected() {
        assert!(extract_bearer_token(&HeaderMap::new()).is_err());
    }

    #[test]
    fn non_bearer_scheme_is_rejected() {
        assert!(extract_bearer_token(&headers_with("Basic abc123")).is_err());
    }

    #[test]
    fn empty_token_is_rejected() {
        assert!(extract_bearer_token(&headers_with("Bearer   ")).is_err());
    }

    #[test]
    fn bearer_token_is_extracted() {
        let token = extract_bearer_token(&headers_with("Bearer tok-123")).unwrap();
        assert_eq!(token, "tok-123");
    }
}
