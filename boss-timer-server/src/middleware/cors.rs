use tower_http::cors::{Any, CorsLayer};

/// Any origin, method and header: the API serves an open companion front-end.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods(Any)
}
