//! Health and readiness handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use emolens_media::{check_ffmpeg, check_ffprobe};

use crate::state::AppState;

/// Welcome response for the root route.
#[derive(Serialize)]
pub struct WelcomeResponse {
    pub message: String,
}

/// Root endpoint.
pub async fn welcome() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: "Welcome to the EmoLens affect analysis API".to_string(),
    })
}

/// Health response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

/// Health check endpoint (liveness probe).
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Readiness check response.
#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub checks: ReadinessChecks,
}

#[derive(Serialize)]
pub struct ReadinessChecks {
    pub ffmpeg: CheckStatus,
    pub ffprobe: CheckStatus,
    pub inference_service: CheckStatus,
}

#[derive(Serialize)]
pub struct CheckStatus {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CheckStatus {
    fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            error: None,
        }
    }

    fn error(msg: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            error: Some(msg.into()),
        }
    }

    fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// Readiness check endpoint. Verifies the FFmpeg binaries are on PATH and
/// the inference service answers its health route.
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadinessResponse>) {
    let ffmpeg = match check_ffmpeg() {
        Ok(_) => CheckStatus::ok(),
        Err(e) => CheckStatus::error(e.to_string()),
    };
    let ffprobe = match check_ffprobe() {
        Ok(_) => CheckStatus::ok(),
        Err(e) => CheckStatus::error(e.to_string()),
    };
    let inference_service = match state.inference.health_check().await {
        Ok(true) => CheckStatus::ok(),
        Ok(false) => CheckStatus::error("Health route returned non-success"),
        Err(e) => CheckStatus::error(e.to_string()),
    };

    let all_ok = ffmpeg.is_ok() && ffprobe.is_ok() && inference_service.is_ok();
    let status = if all_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ReadinessResponse {
            status: if all_ok { "ready" } else { "not_ready" }.to_string(),
            checks: ReadinessChecks {
                ffmpeg,
                ffprobe,
                inference_service,
            },
        }),
    )
}
