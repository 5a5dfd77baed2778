use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod store;
pub mod testing;

use store::{AuthProvider, DataStore};

/// Process-wide dependencies, constructed once at startup from
/// configuration and cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DataStore>,
    pub auth: Arc<dyn AuthProvider>,
    pub password_reset_redirect: Option<String>,
}

pub fn app(state: AppState) -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(public_routes())
        // Protected (auth guard applied per sub-router)
        .merge(protected_routes(state.clone()))
        .with_state(state)
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn public_routes() -> Router<AppState> {
    use handlers::public::{auth, portfolios};

    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/reset-password-request", post(auth::reset_password_request))
        .route("/auth/reset-password", post(auth::reset_password))
        .route("/public/portfolios", get(portfolios::list))
        .route("/public/portfolios/:id", get(portfolios::show))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use handlers::protected::{auth, experiences, portfolio, profile, projects};

    Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/me/portfolio", get(portfolio::show))
        .route("/me/profile", put(profile::update))
        .route("/me/experiences", get(experiences::list).post(experiences::create))
        .route(
            "/me/experiences/:id",
            put(experiences::update).delete(experiences::delete),
        )
        .route("/me/projects", get(projects::list).post(projects::create))
        .route("/me/projects/:id", put(projects::update).delete(projects::delete))
        .route_layer(axum_middleware::from_fn_with_state(state, middleware::require_auth))
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "Folio API",
            "version": version,
            "description": "Portfolio backend API over an external hosted data/auth service",
            "endpoints": {
                "home": "/ (public)",
                "auth": "/auth/register, /auth/login, /auth/reset-password-request, /auth/reset-password (public), /auth/logout (protected)",
                "public": "/public/portfolios[/:id] (public)",
                "me": "/me/portfolio, /me/profile, /me/experiences[/:id], /me/projects[/:id] (protected)",
            }
        }
    }))
}

async fn health() -> axum::response::Json<Value> {
    axum::response::Json(json!({
        "success": true,
        "data": {
            "status": "ok",
            "timestamp": chrono::Utc::now()
        }
    }))
}
