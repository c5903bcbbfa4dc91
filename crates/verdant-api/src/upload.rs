use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use tracing::{error, info, warn};

use verdant_types::api::{LooseInt, UploadRequest, UploadResponse};
use verdant_upload::{ChunkUpload, Outcome, UploadError};

use crate::state::AppState;

/// POST /api/upload: accept one Base64 part of a photo.
///
/// Parts may arrive in any order; the file is assembled when the part whose
/// index equals `total_parts` arrives and every earlier part is on disk.
pub async fn upload_part(
    State(state): State<AppState>,
    payload: Result<Json<UploadRequest>, JsonRejection>,
) -> (StatusCode, Json<UploadResponse>) {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(e) => {
            warn!("Rejected upload body: {}", e);
            return rejection(UploadError::MissingOrInvalidField(e.body_text()));
        }
    };

    let chunk = match into_chunk(req) {
        Ok(chunk) => chunk,
        Err(e) => return rejection(e),
    };

    match state.uploads.accept_chunk(&chunk).await {
        Ok(Outcome::Accepted { part }) => (
            StatusCode::OK,
            Json(UploadResponse::Ok {
                part,
                message: format!("Part {}/{} received", part, chunk.total_parts),
            }),
        ),
        Ok(Outcome::Completed { size, .. }) => {
            info!("Upload {} complete ({} bytes)", chunk.file_id, size);
            (
                StatusCode::OK,
                Json(UploadResponse::Done {
                    file: format!("/uploads/{}", chunk.file_id),
                }),
            )
        }
        Err(e) => rejection(e),
    }
}

/// Check presence and numeric ranges of the wire fields.
pub fn into_chunk(req: UploadRequest) -> Result<ChunkUpload, UploadError> {
    let missing = |field: &str| UploadError::MissingOrInvalidField(format!("Missing data: {field}"));

    let file_id = req
        .filename
        .filter(|f| !f.is_empty())
        .ok_or_else(|| missing("filename"))?;
    let part = positive(req.part.as_ref(), "part")?;
    let total_parts = positive(req.total_parts.as_ref(), "total_parts")?;
    let payload = req
        .data
        .filter(|d| !d.is_empty())
        .ok_or_else(|| missing("data"))?;
    let crc32 = req
        .crc32
        .as_ref()
        .ok_or_else(|| missing("crc32"))?
        .as_i64()
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| {
            UploadError::MissingOrInvalidField("crc32 must be an unsigned 32-bit integer".into())
        })?;

    Ok(ChunkUpload {
        file_id,
        part,
        total_parts,
        payload,
        crc32,
    })
}

fn positive(value: Option<&LooseInt>, field: &str) -> Result<u32, UploadError> {
    let value = value
        .ok_or_else(|| UploadError::MissingOrInvalidField(format!("Missing data: {field}")))?;
    value
        .as_i64()
        .and_then(|n| u32::try_from(n).ok())
        .filter(|n| *n > 0)
        .ok_or_else(|| {
            UploadError::MissingOrInvalidField(format!("{field} must be a positive integer"))
        })
}

pub fn status_for(err: &UploadError) -> StatusCode {
    match err {
        UploadError::MissingOrInvalidField(_)
        | UploadError::ChecksumMismatch { .. }
        | UploadError::InvalidEncoding { .. } => StatusCode::BAD_REQUEST,
        UploadError::IncompleteSequence { .. } => StatusCode::CONFLICT,
        UploadError::ChunkNotFound { .. } | UploadError::Io(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn rejection(err: UploadError) -> (StatusCode, Json<UploadResponse>) {
    let status = status_for(&err);
    if status.is_server_error() {
        error!("Upload failed: {}", err);
    } else {
        warn!("Upload rejected: {}", err);
    }
    (
        status,
        Json(UploadResponse::Error {
            message: err.to_string(),
            part: err.part(),
        }),
    )
}
