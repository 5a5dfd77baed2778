// HTTP clients for the external hosted store.
//
// The data plane is a PostgREST-style row API under /rest/v1, the auth
// plane a GoTrue-style user API under /auth/v1. Both are called with the
// privileged service key; row-level security is not relied on because every
// query is already scoped by owning identifiers in the service layer.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde_json::{json, Value};

use super::{
    AuthError, AuthProvider, AuthSession, AuthUserInfo, DataStore, Filter, SelectQuery, StoreError,
};
use crate::config::AppConfig;

#[derive(Clone)]
pub struct HttpStore {
    http: reqwest::Client,
    base_url: String,
    service_key: String,
}

impl HttpStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.store_url.trim_end_matches('/').to_string(),
            service_key: config.service_key.clone(),
        }
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        let url = format!("{}/rest/v1/{}", self.base_url, table);
        self.http
            .request(method, url)
            .header("apikey", &self.service_key)
            .header("Authorization", format!("Bearer {}", self.service_key))
    }

    async fn rows_response(response: Response) -> Result<Vec<Value>, StoreError> {
        let status = response.status();
        if !status.is_success() {
            let message = error_message(response).await;
            if status == StatusCode::CONFLICT {
                return Err(StoreError::Conflict(message));
            }
            return Err(StoreError::Upstream { status: status.as_u16(), message });
        }
        response
            .json::<Vec<Value>>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }
}

/// Render filters as PostgREST query parameters (`col=eq.v`, `col=in.(a,b)`).
pub(crate) fn filter_params(filters: &[Filter]) -> Vec<(String, String)> {
    filters
        .iter()
        .map(|filter| match filter {
            Filter::Eq(column, value) => (column.clone(), format!("eq.{}", render(value))),
            Filter::In(column, values) => {
                let rendered: Vec<String> = values.iter().map(render).collect();
                (column.clone(), format!("in.({})", rendered.join(",")))
            }
        })
        .collect()
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl DataStore for HttpStore {
    async fn select(&self, table: &str, query: SelectQuery) -> Result<Vec<Value>, StoreError> {
        let mut params = filter_params(&query.filters);
        if let Some(columns) = &query.columns {
            params.push(("select".to_string(), columns.join(",")));
        }
        if let Some((column, dir)) = &query.order {
            params.push(("order".to_string(), format!("{}.{}", column, dir.as_str())));
        }
        if let Some(limit) = query.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }

        let response = self
            .request(Method::GET, table)
            .query(&params)
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;
        Self::rows_response(response).await
    }

    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<Vec<Value>, StoreError> {
        let response = self
            .request(Method::POST, table)
            .header("Prefer", "return=representation")
            .json(&rows)
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;
        Self::rows_response(response).await
    }

    async fn update(
        &self,
        table: &str,
        filters: Vec<Filter>,
        patch: Value,
    ) -> Result<Vec<Value>, StoreError> {
        let response = self
            .request(Method::PATCH, table)
            .header("Prefer", "return=representation")
            .query(&filter_params(&filters))
            .json(&patch)
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;
        Self::rows_response(response).await
    }

    async fn delete(&self, table: &str, filters: Vec<Filter>) -> Result<u64, StoreError> {
        let response = self
            .request(Method::DELETE, table)
            .header("Prefer", "return=representation")
            .query(&filter_params(&filters))
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;
        let rows = Self::rows_response(response).await?;
        Ok(rows.len() as u64)
    }
}

#[derive(Clone)]
pub struct HttpAuth {
    http: reqwest::Client,
    base_url: String,
    service_key: String,
}

impl HttpAuth {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.store_url.trim_end_matches('/').to_string(),
            service_key: config.service_key.clone(),
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/auth/v1/{}", self.base_url, path);
        self.http.request(method, url).header("apikey", &self.service_key)
    }

    fn session_from_body(body: Value) -> Result<AuthSession, AuthError> {
        // A full session carries access_token + user; a signup that still
        // needs email confirmation returns the bare user object instead.
        if let Some(token) = body.get("access_token").and_then(Value::as_str) {
            let user = user_from_value(body.get("user").cloned().unwrap_or(Value::Null))?;
            return Ok(AuthSession {
                access_token: Some(token.to_string()),
                user,
                confirmation_pending: false,
            });
        }

        let confirmation_pending = body.get("confirmation_sent_at").is_some()
            && body.get("confirmed_at").is_none()
            && body.get("email_confirmed_at").is_none();
        let user = user_from_value(body)?;
        Ok(AuthSession { access_token: None, user, confirmation_pending })
    }
}

fn user_from_value(value: Value) -> Result<AuthUserInfo, AuthError> {
    serde_json::from_value(value)
        .map_err(|e| AuthError::Request(format!("malformed user payload: {}", e)))
}

async fn error_message(response: Response) -> String {
    let body = response.json::<Value>().await.unwrap_or(Value::Null);
    for key in ["message", "msg", "error_description", "error"] {
        if let Some(message) = body.get(key).and_then(Value::as_str) {
            return message.to_string();
        }
    }
    "upstream error".to_string()
}

#[async_trait]
impl AuthProvider for HttpAuth {
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let response = self
            .request(Method::POST, "signup")
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| AuthError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = error_message(response).await;
            if status.is_client_error() {
                return Err(AuthError::Rejected(message));
            }
            return Err(AuthError::Upstream { status: status.as_u16(), message });
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(|e| AuthError::Request(e.to_string()))?;
        Self::session_from_body(body)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let response = self
            .request(Method::POST, "token")
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| AuthError::Request(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED {
            return Err(AuthError::InvalidCredentials);
        }
        if !status.is_success() {
            let message = error_message(response).await;
            return Err(AuthError::Upstream { status: status.as_u16(), message });
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(|e| AuthError::Request(e.to_string()))?;
        Self::session_from_body(body)
    }

    async fn get_user(&self, access_token: &str) -> Result<AuthUserInfo, AuthError> {
        let response = self
            .request(Method::GET, "user")
            .header("Authorization", format!("Bearer {}", access_token))
            .send()
            .await
            .map_err(|e| AuthError::Request(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(AuthError::InvalidToken);
        }
        if !status.is_success() {
            let message = error_message(response).await;
            return Err(AuthError::Upstream { status: status.as_u16(), message });
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(|e| AuthError::Request(e.to_string()))?;
        user_from_value(body)
    }

    async fn request_password_reset(
        &self,
        email: &str,
        redirect_to: Option<&str>,
    ) -> Result<(), AuthError> {
        let mut request = self
            .request(Method::POST, "recover")
            .json(&json!({ "email": email }));
        if let Some(redirect) = redirect_to {
            request = request.query(&[("redirect_to", redirect)]);
        }

        let response = request.send().await.map_err(|e| AuthError::Request(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let message = error_message(response).await;
            return Err(AuthError::Upstream { status: status.as_u16(), message });
        }
        Ok(())
    }

    async fn update_password(
        &self,
        access_token: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let response = self
            .request(Method::PUT, "user")
            .header("Authorization", format!("Bearer {}", access_token))
            .json(&json!({ "password": new_password }))
            .send()
            .await
            .map_err(|e| AuthError::Request(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(AuthError::InvalidToken);
        }
        if !status.is_success() {
            let message = error_message(response).await;
            return Err(AuthError::Upstream { status: status.as_u16(), message });
        }
        Ok(())
    }
}
