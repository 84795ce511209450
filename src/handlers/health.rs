use axum::{Json, extract::State};
use std::sync::Arc;

use crate::models::HealthStatus;
use crate::state::{AppState, Backend};

// Always 200; model_path is only reported when the file is actually there
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthStatus> {
    let timestamp = chrono::Utc::now().to_rfc3339();

    let status = match &state.backend {
        Backend::Mock => HealthStatus::Mock {
            status: "ok",
            llm_loaded: false,
            timestamp,
        },
        Backend::Engine { engine, model_path } => HealthStatus::Engine {
            ok: true,
            model_path: model_path
                .exists()
                .then(|| model_path.display().to_string()),
            llm_loaded: engine.is_some(),
            timestamp,
        },
    };

    Json(status)
}
