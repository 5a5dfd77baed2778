// Shared test harness: the full router wired to the in-memory store and
// auth backends, driven in-process through tower's oneshot.
//
// Not every suite uses every helper.
#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use folio_api::testing::{MemoryAuth, MemoryStore};
use folio_api::{app, AppState};

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub auth: Arc<MemoryAuth>,
}

pub fn test_app() -> TestApp {
    test_app_with_auth(MemoryAuth::new())
}

pub fn test_app_with_auth(auth: MemoryAuth) -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let auth = Arc::new(auth);
    let state = AppState {
        store: store.clone(),
        auth: auth.clone(),
        password_reset_redirect: Some("https://app.example.test/reset".to_string()),
    };
    TestApp { router: app(state), store, auth }
}

/// Fire one request at the router and return status + parsed JSON body.
pub async fn request(
    router: &Router,
    method: &str,
    path: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let request = match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&value).expect("encode body")))
            .expect("build request"),
        None => builder.body(Body::empty()).expect("build request"),
    };

    let response = router.clone().oneshot(request).await.expect("dispatch request");
    let status = response.status();
    let bytes = response.into_body().collect().await.expect("read body").to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("parse response body")
    };
    (status, value)
}

/// Register a fresh account; returns its bearer token and user id string.
pub async fn register(router: &Router, email: &str) -> (String, String) {
    let (status, body) = request(
        router,
        "POST",
        "/auth/register",
        None,
        Some(json!({ "email": email, "password": "hunter2!" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "registration failed: {}", body);

    let token = body["data"]["token"].as_str().expect("token in response").to_string();
    let user_id = body["data"]["user"]["id"].as_str().expect("user id in response").to_string();
    (token, user_id)
}
