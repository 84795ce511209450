use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("model file not found at {}", .0.display())]
    ModelNotFound(PathBuf),

    #[error("llama.cpp binary `{}` not found", .0.display())]
    BinaryNotFound(PathBuf),

    #[error("{0}")]
    Failed(String),

    #[error("malformed engine response: {0}")]
    Malformed(String),
}

// a loaded model, calls block for the whole generation
pub trait Engine: Send + Sync {
    fn complete(
        &self,
        prompt: &str,
        max_tokens: i32,
        temperature: f32,
    ) -> Result<Value, EngineError>;
}

// choices win over a flat text field, fragments joined in order
pub fn extract_text(raw: &Value) -> Result<String, EngineError> {
    match raw.get("choices") {
        Some(Value::Array(choices)) => Ok(choices
            .iter()
            .filter_map(|choice| choice.get("text").and_then(Value::as_str))
            .collect()),
        Some(other) => Err(EngineError::Malformed(format!(
            "`choices` should be a list, got {other}"
        ))),
        None => raw
            .get("text")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| EngineError::Malformed("no `choices` or `text` field".into())),
    }
}

pub struct LlamaCliEngine {
    binary: PathBuf,
    model_path: PathBuf,
}

impl LlamaCliEngine {
    pub fn load(
        binary: impl AsRef<Path>,
        model_path: impl AsRef<Path>,
    ) -> Result<Self, EngineError> {
        let model_path = model_path.as_ref();
        if !model_path.is_file() {
            return Err(EngineError::ModelNotFound(model_path.to_path_buf()));
        }
        let binary = resolve_binary(binary.as_ref())?;

        Ok(Self {
            binary,
            model_path: model_path.to_path_buf(),
        })
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }
}

impl Engine for LlamaCliEngine {
    fn complete(
        &self,
        prompt: &str,
        max_tokens: i32,
        temperature: f32,
    ) -> Result<Value, EngineError> {
        let output = Command::new(&self.binary)
            .arg("-m")
            .arg(&self.model_path)
            .arg("-p")
            .arg(prompt)
            .arg("-n")
            .arg(max_tokens.to_string())
            .arg("--temp")
            .arg(temperature.to_string())
            .arg("--no-display-prompt")
            .arg("-no-cnv")
            .output()
            .map_err(|e| {
                EngineError::Failed(format!("failed to start {}: {e}", self.binary.display()))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = stderr.trim();
            return Err(EngineError::Failed(if stderr.is_empty() {
                format!("llama.cpp exited with {}", output.status)
            } else {
                stderr.to_string()
            }));
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        Ok(json!({
            "object": "text_completion",
            "model": self.model_path.display().to_string(),
            "choices": [{
                "index": 0,
                "text": text,
                "finish_reason": "stop",
            }],
        }))
    }
}

// Explicit paths must point at a file, bare names are searched on PATH
fn resolve_binary(binary: &Path) -> Result<PathBuf, EngineError> {
    if binary.components().count() > 1 || binary.is_absolute() {
        return if binary.is_file() {
            Ok(binary.to_path_buf())
        } else {
            Err(EngineError::BinaryNotFound(binary.to_path_buf()))
        };
    }

    let path = std::env::var_os("PATH").unwrap_or_default();
    std::env::split_paths(&path)
        .map(|dir| dir.join(binary))
        .find(|candidate| candidate.is_file())
        .ok_or_else(|| EngineError::BinaryNotFound(binary.to_path_buf()))
}

// a failed load leaves the service up with no engine
pub fn load_engine(binary: &Path, model_path: &Path) -> Option<Arc<dyn Engine>> {
    match LlamaCliEngine::load(binary, model_path) {
        Ok(engine) => {
            info!(
                model = %model_path.display(),
                binary = %engine.binary().display(),
                "LLM engine loaded"
            );
            Some(Arc::new(engine))
        }
        Err(e) => {
            warn!(error = %e, "LLM engine unavailable, generate requests will fail");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_choices_in_order() {
        let raw = json!({ "choices": [{ "text": "a" }, { "text": "b" }] });
        assert_eq!(extract_text(&raw).unwrap(), "ab");
    }

    #[test]
    fn choice_without_text_is_skipped() {
        let raw = json!({ "choices": [{ "text": "a" }, { "index": 1 }, { "text": "c" }] });
        assert_eq!(extract_text(&raw).unwrap(), "ac");
    }

    #[test]
    fn empty_choices_yield_empty_text() {
        assert_eq!(extract_text(&json!({ "choices": [] })).unwrap(), "");
    }

    #[test]
    fn flat_text_used_without_choices() {
        assert_eq!(extract_text(&json!({ "text": "flat" })).unwrap(), "flat");
    }

    #[test]
    fn rejects_shapes_without_text() {
        assert!(matches!(
            extract_text(&json!({ "choices": "nope" })),
            Err(EngineError::Malformed(_))
        ));
        assert!(matches!(
            extract_text(&json!({ "output": "x" })),
            Err(EngineError::Malformed(_))
        ));
    }

    #[test]
    fn failed_error_displays_message_verbatim() {
        assert_eq!(EngineError::Failed("boom".into()).to_string(), "boom");
    }

    #[test]
    fn load_requires_model_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.gguf");
        assert!(matches!(
            LlamaCliEngine::load("llama-cli", &missing),
            Err(EngineError::ModelNotFound(_))
        ));
        assert!(load_engine(Path::new("llama-cli"), &missing).is_none());
    }

    #[test]
    fn load_requires_binary() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("model.gguf");
        std::fs::write(&model, b"gguf").unwrap();
        let binary = dir.path().join("no-such-llama");
        assert!(matches!(
            LlamaCliEngine::load(&binary, &model),
            Err(EngineError::BinaryNotFound(_))
        ));
    }

    #[cfg(unix)]
    fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join(name);
        std::fs::write(&path, body).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    // both scripts run from one test so no other thread forks while they are written
    #[cfg(unix)]
    #[test]
    fn runs_binary_and_reports_failures() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("model.gguf");
        std::fs::write(&model, b"gguf").unwrap();

        let ok = write_script(dir.path(), "fake-llama", "#!/bin/sh\nprintf 'generated'\n");
        let engine = LlamaCliEngine::load(&ok, &model).unwrap();
        let raw = engine.complete("hello", 16, 0.2).unwrap();
        assert_eq!(extract_text(&raw).unwrap(), "generated");
        assert_eq!(raw["model"], model.display().to_string());

        let broken = write_script(
            dir.path(),
            "broken-llama",
            "#!/bin/sh\necho 'bad magic' >&2\nexit 1\n",
        );
        let engine = LlamaCliEngine::load(&broken, &model).unwrap();
        let err = engine.complete("hello", 16, 0.2).unwrap_err();
        assert_eq!(err.to_string(), "bad magic");
    }
}
