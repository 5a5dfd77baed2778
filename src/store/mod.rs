// External store abstraction
//
// Everything this service persists lives in an external hosted service with
// two planes: a row-level data API and a user auth API. Both are modelled as
// traits so the production HTTP client and the in-memory test double are
// interchangeable behind `AppState`.

pub mod http;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

pub use http::{HttpAuth, HttpStore};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unique constraint violation: {0}")]
    Conflict(String),
    #[error("store request failed: {0}")]
    Request(String),
    #[error("store returned {status}: {message}")]
    Upstream { status: u16, message: String },
    #[error("failed to decode store response: {0}")]
    Decode(String),
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("invalid or expired token")]
    InvalidToken,
    #[error("registration rejected: {0}")]
    Rejected(String),
    #[error("auth request failed: {0}")]
    Request(String),
    #[error("auth service returned {status}: {message}")]
    Upstream { status: u16, message: String },
}

/// Row filter, restricted to the two operators this API needs.
#[derive(Debug, Clone)]
pub enum Filter {
    Eq(String, Value),
    In(String, Vec<Value>),
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: Value) -> Self {
        Filter::Eq(column.into(), value)
    }

    pub fn is_in(column: impl Into<String>, values: Vec<Value>) -> Self {
        Filter::In(column.into(), values)
    }

    /// Does a JSON row match this filter?
    pub fn matches(&self, row: &Value) -> bool {
        match self {
            Filter::Eq(column, value) => row.get(column) == Some(value),
            Filter::In(column, values) => match row.get(column) {
                Some(cell) => values.contains(cell),
                None => false,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDir {
    Asc,
    Desc,
}

impl OrderDir {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderDir::Asc => "asc",
            OrderDir::Desc => "desc",
        }
    }
}

/// Builder for a row read: filters, optional column projection, ordering
/// and limit. Kept deliberately small - the external store does the real
/// query planning.
#[derive(Debug, Clone, Default)]
pub struct SelectQuery {
    pub columns: Option<Vec<String>>,
    pub filters: Vec<Filter>,
    pub order: Option<(String, OrderDir)>,
    pub limit: Option<usize>,
}

impl SelectQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = Some(columns.iter().map(|c| (*c).to_string()).collect());
        self
    }

    pub fn eq(mut self, column: &str, value: Value) -> Self {
        self.filters.push(Filter::eq(column, value));
        self
    }

    pub fn is_in(mut self, column: &str, values: Vec<Value>) -> Self {
        self.filters.push(Filter::is_in(column, values));
        self
    }

    pub fn order_asc(mut self, column: &str) -> Self {
        self.order = Some((column.to_string(), OrderDir::Asc));
        self
    }

    pub fn order_desc(mut self, column: &str) -> Self {
        self.order = Some((column.to_string(), OrderDir::Desc));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Row-level access to the external data plane. Rows travel as JSON values;
/// callers decode into typed models with [`decode_rows`] / [`decode_row`].
#[async_trait]
pub trait DataStore: Send + Sync {
    async fn select(&self, table: &str, query: SelectQuery) -> Result<Vec<Value>, StoreError>;

    /// Insert rows and return their stored representation.
    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<Vec<Value>, StoreError>;

    /// Patch all rows matching `filters` and return the updated rows.
    async fn update(
        &self,
        table: &str,
        filters: Vec<Filter>,
        patch: Value,
    ) -> Result<Vec<Value>, StoreError>;

    /// Delete all rows matching `filters`, returning how many went away.
    async fn delete(&self, table: &str, filters: Vec<Filter>) -> Result<u64, StoreError>;
}

/// Principal resolved by the external auth plane.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AuthUserInfo {
    pub id: Uuid,
    pub email: Option<String>,
}

/// Outcome of a sign-up or sign-in call. `access_token` is absent when the
/// store withheld a session (e.g. email confirmation still pending).
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub access_token: Option<String>,
    pub user: AuthUserInfo,
    pub confirmation_pending: bool,
}

/// Credential operations delegated to the external auth service. No tokens
/// are minted or validated locally.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession, AuthError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError>;

    /// Resolve a bearer token to its principal. Every protected request
    /// goes through here - there is no local validation or caching.
    async fn get_user(&self, access_token: &str) -> Result<AuthUserInfo, AuthError>;

    async fn request_password_reset(
        &self,
        email: &str,
        redirect_to: Option<&str>,
    ) -> Result<(), AuthError>;

    async fn update_password(
        &self,
        access_token: &str,
        new_password: &str,
    ) -> Result<(), AuthError>;
}

pub fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>, StoreError> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(|e| StoreError::Decode(e.to_string())))
        .collect()
}

pub fn decode_row<T: DeserializeOwned>(row: Value) -> Result<T, StoreError> {
    serde_json::from_value(row).map_err(|e| StoreError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn eq_filter_matches_on_column_value() {
        let row = json!({ "id": "a", "order_index": 2 });
        assert!(Filter::eq("order_index", json!(2)).matches(&row));
        assert!(!Filter::eq("order_index", json!(3)).matches(&row));
        assert!(!Filter::eq("missing", json!(2)).matches(&row));
    }

    #[test]
    fn in_filter_matches_any_listed_value() {
        let row = json!({ "project_id": "p2" });
        let filter = Filter::is_in("project_id", vec![json!("p1"), json!("p2")]);
        assert!(filter.matches(&row));
        let filter = Filter::is_in("project_id", vec![json!("p3")]);
        assert!(!filter.matches(&row));
    }

    #[test]
    fn select_query_builder_collects_clauses() {
        let query = SelectQuery::new()
            .columns(&["id", "title"])
            .eq("profile_id", json!("x"))
            .order_asc("order_index")
            .limit(5);

        assert_eq!(query.columns.as_deref(), Some(&["id".to_string(), "title".to_string()][..]));
        assert_eq!(query.filters.len(), 1);
        assert_eq!(query.order, Some(("order_index".to_string(), OrderDir::Asc)));
        assert_eq!(query.limit, Some(5));
    }
}
