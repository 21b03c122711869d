use crate::api::error::AppError;
use crate::services::pdf;
use crate::utils::validation::sanitize_filename;
use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::header,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct ExportRequest {
    pub markdown: String,
    pub title: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/export-pdf",
    request_body = ExportRequest,
    responses(
        (status = 200, description = "Rendered PDF document", content_type = "application/pdf"),
        (status = 400, description = "Empty markdown"),
        (status = 500, description = "Rendering failure")
    ),
    tag = "analysis"
)]
pub async fn export_pdf(
    payload: Result<Json<ExportRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(req) = payload?;

    if req.markdown.trim().is_empty() {
        return Err(AppError::Validation("markdown is required".to_string()));
    }

    let title = req.title.as_deref().unwrap_or("Video Notes");
    let bytes = pdf::render_markdown(&req.markdown, title)
        .map_err(|e| AppError::Internal(format!("PDF rendering failed: {}", e)))?;

    let file_name = sanitize_filename(&format!("{}.pdf", title))
        .unwrap_or_else(|_| "video-notes.pdf".to_string());

    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file_name),
        ),
    ];

    Ok((headers, bytes).into_response())
}
