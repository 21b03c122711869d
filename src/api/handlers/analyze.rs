use crate::api::error::AppError;
use crate::utils::validation::validate_video_type;
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub upload_id: Uuid,
    pub file_path: String,
    pub mime_type: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub success: bool,
    pub markdown: String,
    pub upload_id: Uuid,
}

#[utoipa::path(
    post,
    path = "/api/analyze",
    request_body = AnalyzeRequest,
    responses(
        (status = 200, description = "Generated markdown notes", body = AnalyzeResponse),
        (status = 400, description = "Missing or invalid input"),
        (status = 404, description = "Uploaded file no longer present"),
        (status = 500, description = "Provider or internal failure"),
        (status = 504, description = "Media processing timed out")
    ),
    tag = "analysis"
)]
pub async fn analyze_video(
    State(state): State<crate::AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let Json(req) = payload?;

    if req.file_path.is_empty() {
        return Err(AppError::Validation("filePath is required".to_string()));
    }

    let file_path = PathBuf::from(&req.file_path);
    if !state.scratch.contains(&file_path) {
        return Err(AppError::Validation(format!(
            "path {} is outside the scratch directory",
            req.file_path
        )));
    }

    validate_video_type(&req.mime_type, &state.config.allowed_video_types)
        .map_err(|e| AppError::Validation(e.to_string()))?;

    // Runs inside the request future: a client disconnect cancels the
    // pipeline (including the poll sleep), while the orchestrator's teardown
    // guard still releases the scratch file and any staged remote file.
    let result = state
        .analysis
        .analyze(req.upload_id, &file_path, &req.mime_type)
        .await?;

    Ok(Json(AnalyzeResponse {
        success: true,
        markdown: result.markdown,
        upload_id: result.upload_id,
    }))
}
