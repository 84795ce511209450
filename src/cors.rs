use axum::http::HeaderValue;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};

// Local frontend dev servers
pub const ALLOWED_ORIGINS: [&str; 2] = ["http://localhost:3000", "http://127.0.0.1:3000"];

// Credentials rule out wildcards, so methods and headers mirror the preflight
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(ALLOWED_ORIGINS.map(HeaderValue::from_static))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}
