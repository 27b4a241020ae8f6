//! Analysis upload handlers.

use std::time::Instant;

use axum::extract::{Multipart, State};
use axum::Json;
use tracing::info;

use emolens_models::{AnalysisReport, AudioReport};

use crate::error::{ApiError, ApiResult};
use crate::metrics::record_analysis;
use crate::state::AppState;

/// One uploaded file from a multipart form.
struct Upload {
    filename: String,
    bytes: Vec<u8>,
}

/// Pull the `file` field out of a multipart request.
async fn read_upload(multipart: &mut Multipart) -> ApiResult<Upload> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .ok_or_else(|| ApiError::bad_request("Missing filename on file field"))?
            .to_string();

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read upload: {}", e)))?
            .to_vec();

        return Ok(Upload { filename, bytes });
    }

    Err(ApiError::bad_request("Missing multipart field 'file'"))
}

/// Extension declared by the uploaded filename.
fn extension_of(filename: &str) -> ApiResult<&str> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty())
        .ok_or_else(|| {
            ApiError::UnsupportedMediaType(format!("Filename has no extension: {}", filename))
        })
}

/// `POST /analyze`: multimodal analysis of an uploaded video.
pub async fn analyze_video(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<AnalysisReport>> {
    let upload = read_upload(&mut multipart).await?;
    let extension = extension_of(&upload.filename)?;

    info!(
        filename = %upload.filename,
        size_bytes = upload.bytes.len(),
        "Video analysis upload"
    );

    let start = Instant::now();
    let result = state.pipeline.analyze_video(&upload.bytes, extension).await;
    record_analysis("video", result.is_ok(), start.elapsed().as_secs_f64());

    Ok(Json(result?))
}

/// `POST /analyze-audio`: prosody, transcript and sentiment for a WAV upload.
pub async fn analyze_audio(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<AudioReport>> {
    let upload = read_upload(&mut multipart).await?;

    info!(
        filename = %upload.filename,
        size_bytes = upload.bytes.len(),
        "Audio analysis upload"
    );

    let start = Instant::now();
    let result = state.pipeline.analyze_audio(&upload.bytes).await;
    record_analysis("audio", result.is_ok(), start.elapsed().as_secs_f64());

    Ok(Json(result?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("clip.mp4").unwrap(), "mp4");
        assert_eq!(extension_of("a.b.mkv").unwrap(), "mkv");
        assert!(extension_of("noextension").is_err());
        assert!(extension_of("trailingdot.").is_err());
    }
}
