//! EmoLens HTTP API.
//!
//! Exposes the analysis pipeline over two multipart upload endpoints
//! plus health, readiness and Prometheus metrics routes.

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
