use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::engine::EngineError;
use crate::models::ErrorBody;

pub const ENGINE_UNAVAILABLE: &str =
    "LLM not available. Install llama.cpp (llama-cli) and set LLM_MODEL_PATH to a GGUF model file.";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{}", ENGINE_UNAVAILABLE)]
    EngineUnavailable,

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("{}", .0.body_text())]
    InvalidRequest(#[from] JsonRejection),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::EngineUnavailable | ApiError::Engine(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::InvalidRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            detail: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
