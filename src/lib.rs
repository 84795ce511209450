pub mod config;
pub mod cors;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod state;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use handlers::{generate_handler, health_handler, metrics_handler};
use state::AppState;

// creating the router with routes
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/generate", post(generate_handler))
        .route("/metrics", get(metrics_handler)) // metrics endpoint
        .layer(cors::cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
