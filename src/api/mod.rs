use axum::{
    Json,
    Router,
    extract::State,
    http::HeaderValue,
    routing::{delete, get, patch, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db::Store;

pub mod access;
pub mod auth;
mod boards;
mod error;
mod settings;
mod tokens;
mod types;
mod widgets;

pub use error::ApiError;
pub use types::*;

pub struct AppState {
    pub config: Config,
    pub store: Store,
}

pub async fn create_app_state_from_config(config: Config) -> anyhow::Result<Arc<AppState>> {
    let store = Store::with_pool_options(
        &config.general.database_url,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;

    Ok(Arc::new(AppState { config, store }))
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config.server.cors_allowed_origins.clone();

    let api_router = Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/auth/change-password", post(auth::change_password))
        .route("/boards", get(boards::list_boards))
        .route("/boards", post(boards::create_board))
        .route("/boards/{id}", get(boards::get_board))
        .route("/boards/{id}", put(boards::update_board))
        .route("/boards/{id}", delete(boards::delete_board))
        .route("/boards/{id}/widgets", post(widgets::create_widget))
        .route(
            "/boards/{id}/widgets/{widget_id}",
            put(widgets::update_widget),
        )
        .route(
            "/boards/{id}/widgets/{widget_id}",
            delete(widgets::delete_widget),
        )
        .route("/boards/{id}/settings", get(settings::get_settings))
        .route("/boards/{id}/settings", put(settings::update_settings))
        .route("/boards/{id}/access-tokens", post(tokens::create_token))
        .route("/boards/{id}/access-tokens", get(tokens::list_tokens))
        .route(
            "/boards/{id}/access-tokens/{token_id}",
            patch(tokens::update_token),
        )
        .route(
            "/boards/{id}/access-tokens/{token_id}",
            delete(tokens::delete_token),
        );

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api/v1", api_router)
        .route("/health", get(health))
        .with_state(state)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}

async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let database = if state.store.ping().await.is_ok() {
        "up"
    } else {
        "down"
    };

    Json(serde_json::json!({
        "status": if database == "up" { "ok" } else { "degraded" },
        "database": database,
    }))
}
