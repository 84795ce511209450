mod generate;
mod health;
mod metrics;

pub use generate::{MOCK_PREFIX, generate_handler};
pub use health::health_handler;
pub use metrics::metrics_handler;
