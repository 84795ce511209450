use lazy_static::lazy_static;
use prometheus::{
    Counter, Encoder, Gauge, Histogram, TextEncoder, register_counter, register_gauge,
    register_histogram,
};

lazy_static! {
    pub static ref REQUEST_TOTAL: Counter = register_counter!(
        "llm_generate_requests_total",
        "Total number of generate requests"
    )
    .unwrap();
    pub static ref REQUEST_FAILURES: Counter = register_counter!(
        "llm_generate_failures_total",
        "Generate requests answered with an error"
    )
    .unwrap();
    pub static ref REQUEST_LATENCY: Histogram = register_histogram!(
        "llm_generate_latency_seconds",
        "Generate latency in seconds"
    )
    .unwrap();
    pub static ref ENGINE_LOADED: Gauge =
        register_gauge!("llm_engine_loaded", "1 when an inference engine is loaded").unwrap();
}

// Prometheus text exposition of everything registered in the default registry
pub fn render() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&prometheus::gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
