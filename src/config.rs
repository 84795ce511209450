use clap::Parser;
use std::path::PathBuf;

pub const DEFAULT_MODEL_PATH: &str = "models/model.gguf";

// CLI argument structure, every flag can also come from the environment
#[derive(Parser, Debug, Clone)]
#[command(name = "local-llm-server")]
#[command(about = "HTTP front for a locally loaded language model")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    // GGUF model file handed to the engine
    #[arg(short, long, env = "LLM_MODEL_PATH", default_value = DEFAULT_MODEL_PATH)]
    pub model_path: PathBuf,

    // llama.cpp binary, bare names are looked up on PATH
    #[arg(short, long, env = "LLM_BINARY", default_value = "llama-cli")]
    pub binary: PathBuf,

    // Serve canned responses instead of loading a model
    #[arg(long, env = "LLM_MOCK", default_value_t = false)]
    pub mock: bool,
}

impl Args {
    pub fn bind_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}
