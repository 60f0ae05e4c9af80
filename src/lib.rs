use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod config;
pub mod services;
pub mod state;

use api::create_api_router;
use state::AppState;

async fn health_check() -> &'static str {
    "NovHawk Billing Backend is running 🚀"
}

pub fn create_app_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(health_check))
        .merge(create_api_router())
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
