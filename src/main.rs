use std::sync::Arc;

use folio_api::config::AppConfig;
use folio_api::store::{HttpAuth, HttpStore};
use folio_api::{app, AppState};

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up SUPABASE_URL etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("configuration error: {}", err);
            std::process::exit(1);
        }
    };

    let state = AppState {
        store: Arc::new(HttpStore::new(&config)),
        auth: Arc::new(HttpAuth::new(&config)),
        password_reset_redirect: config.password_reset_redirect.clone(),
    };

    let app = app(state);

    let bind_addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("Folio API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}
