// In-memory implementations of the store traits, used by the unit and
// integration test suites in place of the external hosted service.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::store::{
    AuthError, AuthProvider, AuthSession, AuthUserInfo, DataStore, Filter, OrderDir, SelectQuery,
    StoreError,
};

/// Filterable row bag mimicking the external data plane, including the
/// unique constraint on `profiles.user_id` so the provisioning conflict
/// path can be exercised.
pub struct MemoryStore {
    tables: Mutex<HashMap<String, Vec<Value>>>,
    unique_keys: Vec<(&'static str, &'static str)>,
    miss_once: Mutex<HashSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(HashMap::new()),
            unique_keys: vec![("profiles", "user_id")],
            miss_once: Mutex::new(HashSet::new()),
        }
    }

    /// Seed rows directly, bypassing constraint checks.
    pub async fn insert_raw(&self, table: &str, rows: Vec<Value>) {
        let mut tables = self.tables.lock().expect("store lock");
        tables.entry(table.to_string()).or_default().extend(rows);
    }

    /// Force the next select against `table` to come back empty, simulating
    /// a read that raced a concurrent writer.
    pub fn miss_next_select(&self, table: &str) {
        self.miss_once.lock().expect("store lock").insert(table.to_string());
    }
}

fn compare_cells(a: &Value, b: &Value) -> std::cmp::Ordering {
    use std::cmp::Ordering::*;
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Null, Value::Null) => Equal,
        (Value::Null, _) => Less,
        (_, Value::Null) => Greater,
        _ => Equal,
    }
}

fn project_columns(row: &Value, columns: &[String]) -> Value {
    let mut out = serde_json::Map::new();
    if let Value::Object(map) = row {
        for column in columns {
            if let Some(cell) = map.get(column) {
                out.insert(column.clone(), cell.clone());
            }
        }
    }
    Value::Object(out)
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn select(&self, table: &str, query: SelectQuery) -> Result<Vec<Value>, StoreError> {
        if self.miss_once.lock().expect("store lock").remove(table) {
            return Ok(Vec::new());
        }

        let tables = self.tables.lock().expect("store lock");
        let mut rows: Vec<Value> = tables
            .get(table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| query.filters.iter().all(|f| f.matches(row)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some((column, dir)) = &query.order {
            rows.sort_by(|a, b| {
                let ordering = compare_cells(
                    a.get(column).unwrap_or(&Value::Null),
                    b.get(column).unwrap_or(&Value::Null),
                );
                match dir {
                    OrderDir::Asc => ordering,
                    OrderDir::Desc => ordering.reverse(),
                }
            });
        }

        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }

        if let Some(columns) = &query.columns {
            rows = rows.iter().map(|row| project_columns(row, columns)).collect();
        }

        Ok(rows)
    }

    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<Vec<Value>, StoreError> {
        let mut tables = self.tables.lock().expect("store lock");
        let stored = tables.entry(table.to_string()).or_default();

        for (unique_table, column) in &self.unique_keys {
            if *unique_table != table {
                continue;
            }
            for row in &rows {
                let incoming = row.get(*column);
                if incoming.is_some() && stored.iter().any(|existing| existing.get(*column) == incoming) {
                    return Err(StoreError::Conflict(format!(
                        "duplicate key value violates unique constraint on {}.{}",
                        table, column
                    )));
                }
            }
        }

        stored.extend(rows.iter().cloned());
        Ok(rows)
    }

    async fn update(
        &self,
        table: &str,
        filters: Vec<Filter>,
        patch: Value,
    ) -> Result<Vec<Value>, StoreError> {
        let mut tables = self.tables.lock().expect("store lock");
        let rows = tables.entry(table.to_string()).or_default();
        let patch_map = match patch {
            Value::Object(map) => map,
            other => {
                return Err(StoreError::Request(format!("patch must be an object, got {}", other)))
            }
        };

        let mut updated = Vec::new();
        for row in rows.iter_mut() {
            if filters.iter().all(|f| f.matches(row)) {
                if let Value::Object(map) = row {
                    for (key, value) in &patch_map {
                        map.insert(key.clone(), value.clone());
                    }
                }
                updated.push(row.clone());
            }
        }
        Ok(updated)
    }

    async fn delete(&self, table: &str, filters: Vec<Filter>) -> Result<u64, StoreError> {
        let mut tables = self.tables.lock().expect("store lock");
        let rows = tables.entry(table.to_string()).or_default();
        let before = rows.len();
        rows.retain(|row| !filters.iter().all(|f| f.matches(row)));
        Ok((before - rows.len()) as u64)
    }
}

struct MemoryUser {
    id: Uuid,
    email: String,
    password: String,
}

#[derive(Default)]
struct AuthInner {
    users: Vec<MemoryUser>,
    tokens: HashMap<String, Uuid>,
}

/// Credential table standing in for the external auth plane.
#[derive(Default)]
pub struct MemoryAuth {
    inner: Mutex<AuthInner>,
    require_confirmation: bool,
    fail_reset_requests: AtomicBool,
}

impl MemoryAuth {
    pub fn new() -> Self {
        Self::default()
    }

    /// Variant where sign-ups get no session until the (simulated) email
    /// confirmation completes.
    pub fn confirmation_required() -> Self {
        Self { require_confirmation: true, ..Self::default() }
    }

    /// Make subsequent password-reset requests fail upstream, for testing
    /// the anti-enumeration response policy.
    pub fn fail_password_resets(&self) {
        self.fail_reset_requests.store(true, Ordering::SeqCst);
    }

    fn issue_token(inner: &mut AuthInner, user_id: Uuid) -> String {
        let token = format!("tok-{}", Uuid::new_v4().simple());
        inner.tokens.insert(token.clone(), user_id);
        token
    }
}

#[async_trait]
impl AuthProvider for MemoryAuth {
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let mut inner = self.inner.lock().expect("auth lock");
        if inner.users.iter().any(|u| u.email == email) {
            return Err(AuthError::Rejected("User already registered".to_string()));
        }

        let id = Uuid::new_v4();
        inner.users.push(MemoryUser {
            id,
            email: email.to_string(),
            password: password.to_string(),
        });

        let user = AuthUserInfo { id, email: Some(email.to_string()) };
        if self.require_confirmation {
            return Ok(AuthSession { access_token: None, user, confirmation_pending: true });
        }

        let token = Self::issue_token(&mut inner, id);
        Ok(AuthSession { access_token: Some(token), user, confirmation_pending: false })
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let mut inner = self.inner.lock().expect("auth lock");
        let (id, email) = match inner
            .users
            .iter()
            .find(|u| u.email == email && u.password == password)
        {
            Some(user) => (user.id, user.email.clone()),
            None => return Err(AuthError::InvalidCredentials),
        };

        let token = Self::issue_token(&mut inner, id);
        Ok(AuthSession {
            access_token: Some(token),
            user: AuthUserInfo { id, email: Some(email) },
            confirmation_pending: false,
        })
    }

    async fn get_user(&self, access_token: &str) -> Result<AuthUserInfo, AuthError> {
        let inner = self.inner.lock().expect("auth lock");
        let user_id = inner.tokens.get(access_token).copied().ok_or(AuthError::InvalidToken)?;
        let user = inner
            .users
            .iter()
            .find(|u| u.id == user_id)
            .ok_or(AuthError::InvalidToken)?;
        Ok(AuthUserInfo { id: user.id, email: Some(user.email.clone()) })
    }

    async fn request_password_reset(
        &self,
        _email: &str,
        _redirect_to: Option<&str>,
    ) -> Result<(), AuthError> {
        if self.fail_reset_requests.load(Ordering::SeqCst) {
            return Err(AuthError::Upstream {
                status: 500,
                message: "mail dispatch failed".to_string(),
            });
        }
        Ok(())
    }

    async fn update_password(
        &self,
        access_token: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let mut inner = self.inner.lock().expect("auth lock");
        let user_id = inner.tokens.get(access_token).copied().ok_or(AuthError::InvalidToken)?;
        let user = inner
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or(AuthError::InvalidToken)?;
        user.password = new_password.to_string();
        Ok(())
    }
}
