use std::path::PathBuf;
use std::sync::Arc;

use crate::engine::Engine;

// Which flavour of /api/generate this process serves, fixed at startup
#[derive(Clone)]
pub enum Backend {
    Mock,
    Engine {
        engine: Option<Arc<dyn Engine>>,
        model_path: PathBuf,
    },
}

// app's shared state
pub struct AppState {
    pub backend: Backend,
}

impl AppState {
    pub fn mock() -> Self {
        Self {
            backend: Backend::Mock,
        }
    }

    pub fn with_engine(engine: Option<Arc<dyn Engine>>, model_path: impl Into<PathBuf>) -> Self {
        Self {
            backend: Backend::Engine {
                engine,
                model_path: model_path.into(),
            },
        }
    }

    pub fn llm_loaded(&self) -> bool {
        matches!(self.backend, Backend::Engine { engine: Some(_), .. })
    }
}
