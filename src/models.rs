use serde::{Deserialize, Deserializer, Serialize, de::Error};
use serde_json::Value;

pub const DEFAULT_TEMPERATURE: f32 = 0.2;
pub const ENGINE_DEFAULT_MAX_TOKENS: i32 = 256;
pub const MOCK_DEFAULT_MAX_TOKENS: i32 = 512;

// Generation request, defaults for max_tokens depend on the variant serving it
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct GenerateRequest {
    pub prompt: String,
    #[serde(default, deserialize_with = "lax_int")]
    pub max_tokens: Option<i32>,
    #[serde(default, deserialize_with = "lax_float")]
    pub temperature: Option<f32>,
}

// numbers may arrive as numeric strings, integral floats count as ints
fn lax_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i32>, D::Error> {
    let int = match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(i) => i,
            None => match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() <= i64::MAX as f64 => f as i64,
                _ => return Err(D::Error::custom(format!("expected an integer, got {n}"))),
            },
        },
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| D::Error::custom(format!("expected an integer, got {s:?}")))?,
        Some(other) => return Err(D::Error::custom(format!("expected an integer, got {other}"))),
    };

    i32::try_from(int)
        .map(Some)
        .map_err(|_| D::Error::custom(format!("integer {int} out of range")))
}

fn lax_float<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f32>, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_f64()
            .map(|f| Some(f as f32))
            .ok_or_else(|| D::Error::custom(format!("expected a number, got {n}"))),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f32>()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("expected a number, got {s:?}"))),
        Some(other) => Err(D::Error::custom(format!("expected a number, got {other}"))),
    }
}

impl GenerateRequest {
    pub fn max_tokens_or(&self, default: i32) -> i32 {
        self.max_tokens.unwrap_or(default)
    }

    pub fn temperature(&self) -> f32 {
        self.temperature.unwrap_or(DEFAULT_TEMPERATURE)
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct GenerateResponse {
    pub text: String,
    // unmodified engine output, kept for diagnostics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<Value>,
}

#[derive(Serialize, Clone, Debug)]
#[serde(untagged)]
pub enum HealthStatus {
    Engine {
        ok: bool,
        model_path: Option<String>,
        llm_loaded: bool,
        timestamp: String,
    },
    Mock {
        status: &'static str,
        llm_loaded: bool,
        timestamp: String,
    },
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ErrorBody {
    pub detail: String,
}
