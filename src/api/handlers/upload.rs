use crate::api::error::AppError;
use crate::models::UploadHandle;
use crate::utils::validation::{sanitize_filename, validate_file_size, validate_video_type};
use axum::{
    Json,
    extract::{Multipart, State},
};
use tracing::info;
use uuid::Uuid;

#[utoipa::path(
    post,
    path = "/api/upload",
    request_body(content = Multipart, description = "Video file upload, single 'file' field"),
    responses(
        (status = 200, description = "Upload accepted", body = UploadHandle),
        (status = 400, description = "Unsupported media type or oversized file"),
        (status = 500, description = "Scratch storage failure")
    ),
    tag = "analysis"
)]
pub async fn upload_video(
    State(state): State<crate::AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadHandle>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("malformed multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = sanitize_filename(field.file_name().unwrap_or("upload"))
            .map_err(|e| AppError::Validation(e.to_string()))?;
        let mime_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();

        // Type check before buffering, size check before writing: a rejected
        // upload never touches the scratch directory.
        validate_video_type(&mime_type, &state.config.allowed_video_types)
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("failed to read file field: {}", e)))?;

        validate_file_size(data.len(), state.config.max_file_size)
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let upload_id = Uuid::new_v4();
        let path = state
            .scratch
            .save(upload_id, &file_name, &data)
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;

        info!(
            "accepted upload {} ({} bytes, {})",
            upload_id,
            data.len(),
            mime_type
        );

        return Ok(Json(UploadHandle {
            upload_id,
            file_path: path.to_string_lossy().into_owned(),
            file_name,
            mime_type,
            size: data.len() as u64,
        }));
    }

    Err(AppError::Validation(
        "no 'file' field in multipart body".to_string(),
    ))
}
