//! API routes.

use axum::extract::DefaultBodyLimit;
use axum::http::header;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{analyze_audio, analyze_video, health, ready, welcome};
use crate::metrics::metrics_middleware;
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let analysis_routes = Router::new()
        .route("/analyze", post(analyze_video))
        .route("/analyze-audio", post(analyze_audio));

    let health_routes = Router::new()
        .route("/", get(welcome))
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/ready", get(ready));

    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    let max_body_size = state.config.max_body_size;

    Router::new()
        .merge(analysis_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        // Body limit applies to video uploads; axum's default 2MB cap is
        // lifted in favor of the configured one.
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(RequestBodyLimitLayer::new(max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed_headers = [header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT];

    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_methods(Any)
            .allow_origin(Any)
            .allow_headers(allowed_headers)
    } else {
        let parsed: Vec<axum::http::HeaderValue> =
            origins.iter().filter_map(|o| o.parse().ok()).collect();
        CorsLayer::new()
            .allow_methods(Any)
            .allow_origin(parsed)
            .allow_headers(allowed_headers)
    }
}
