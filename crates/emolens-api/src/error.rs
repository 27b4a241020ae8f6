//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use emolens_pipeline::PipelineError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Pipeline(e) => match e {
                PipelineError::UnsupportedFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                _ if e.is_client_error() => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Don't expose internal error details in production
        let detail = if status == StatusCode::INTERNAL_SERVER_ERROR
            && std::env::var("ENVIRONMENT").unwrap_or_default() == "production"
        {
            "An internal error occurred".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorResponse { detail };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_pipeline_errors_map_to_4xx() {
        let err = ApiError::from(PipelineError::UnsupportedFormat("txt".into()));
        assert_eq!(err.status_code(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

        let err = ApiError::from(PipelineError::EmptyUpload);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err = ApiError::from(PipelineError::InvalidVideo("broken container".into()));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_system_pipeline_errors_map_to_500() {
        let err = ApiError::from(PipelineError::internal("ffmpeg missing"));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let err = ApiError::from(PipelineError::Transcode("libx264 failed".into()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
