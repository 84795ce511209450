use axum::{Json, extract::State, extract::rejection::JsonRejection};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use crate::engine::{Engine, EngineError, extract_text};
use crate::error::ApiError;
use crate::metrics::{REQUEST_FAILURES, REQUEST_LATENCY, REQUEST_TOTAL};
use crate::models::{
    ENGINE_DEFAULT_MAX_TOKENS, GenerateRequest, GenerateResponse, MOCK_DEFAULT_MAX_TOKENS,
};
use crate::state::{AppState, Backend};

pub const MOCK_PREFIX: &str = "Mock response for prompt: ";
const MOCK_ECHO_CHARS: usize = 200;

pub async fn generate_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>, ApiError> {
    REQUEST_TOTAL.inc();
    let start_time = Instant::now();

    let result = match payload {
        Ok(Json(req)) => generate(&state.backend, req).await,
        Err(rejection) => Err(ApiError::from(rejection)),
    };

    REQUEST_LATENCY.observe(start_time.elapsed().as_secs_f64());
    if let Err(e) = &result {
        REQUEST_FAILURES.inc();
        warn!(error = %e, "generate failed");
    }

    result.map(Json)
}

async fn generate(backend: &Backend, req: GenerateRequest) -> Result<GenerateResponse, ApiError> {
    match backend {
        Backend::Mock => Ok(mock_response(&req)),
        Backend::Engine { engine: None, .. } => Err(ApiError::EngineUnavailable),
        Backend::Engine {
            engine: Some(engine),
            ..
        } => run_engine(Arc::clone(engine), req).await,
    }
}

pub fn mock_response(req: &GenerateRequest) -> GenerateResponse {
    debug!(max_tokens = req.max_tokens_or(MOCK_DEFAULT_MAX_TOKENS), "mock generate");
    let echoed: String = req.prompt.chars().take(MOCK_ECHO_CHARS).collect();
    GenerateResponse {
        text: format!("{MOCK_PREFIX}{echoed}"),
        raw: None,
    }
}

// The engine call blocks for the whole generation, keep it off the executor
async fn run_engine(
    engine: Arc<dyn Engine>,
    req: GenerateRequest,
) -> Result<GenerateResponse, ApiError> {
    let max_tokens = req.max_tokens_or(ENGINE_DEFAULT_MAX_TOKENS);
    let temperature = req.temperature();
    debug!(max_tokens, temperature, "invoking engine");

    let raw = tokio::task::spawn_blocking(move || {
        engine.complete(&req.prompt, max_tokens, temperature)
    })
    .await
    .map_err(|e| EngineError::Failed(panic_message(e)))??;

    let text = extract_text(&raw)?;
    Ok(GenerateResponse {
        text,
        raw: Some(raw),
    })
}

fn panic_message(err: tokio::task::JoinError) -> String {
    match err.try_into_panic() {
        Ok(payload) => payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "engine panicked".to_string()),
        Err(err) => err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(prompt: &str) -> GenerateRequest {
        GenerateRequest {
            prompt: prompt.to_string(),
            max_tokens: None,
            temperature: None,
        }
    }

    #[test]
    fn mock_echoes_prompt() {
        assert_eq!(
            mock_response(&request("hello")).text,
            "Mock response for prompt: hello"
        );
    }

    #[test]
    fn mock_truncates_by_characters() {
        let prompt = "é".repeat(250);
        let text = mock_response(&request(&prompt)).text;
        let echoed = text.strip_prefix(MOCK_PREFIX).unwrap();
        assert_eq!(echoed.chars().count(), 200);
    }
}
