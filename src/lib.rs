pub mod api;
pub mod config;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod utils;

use crate::api::handlers;
use crate::config::AppConfig;
use crate::services::analysis::AnalysisService;
use crate::services::scratch::ScratchStore;
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::upload::upload_video,
        handlers::analyze::analyze_video,
        handlers::export::export_pdf,
        handlers::health::health_check,
    ),
    components(
        schemas(
            models::UploadHandle,
            handlers::analyze::AnalyzeRequest,
            handlers::analyze::AnalyzeResponse,
            handlers::export::ExportRequest,
            handlers::health::HealthResponse,
        )
    ),
    tags(
        (name = "analysis", description = "Video upload, notes generation and export"),
        (name = "system", description = "Service health")
    )
)]
pub struct ApiDoc;

// Slack on top of the size ceiling so oversized uploads reach the handler's
// validation and get the distinct "file too large" error.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub scratch: Arc<ScratchStore>,
    pub analysis: Arc<AnalysisService>,
    pub config: AppConfig,
}

pub fn create_app(state: AppState) -> Router {
    let body_limit = state.config.max_file_size + MULTIPART_OVERHEAD;
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(handlers::health::health_check))
        .route("/api/upload", post(handlers::upload::upload_video))
        .route("/api/analyze", post(handlers::analyze::analyze_video))
        .route("/api/export-pdf", post(handlers::export::export_pdf))
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
