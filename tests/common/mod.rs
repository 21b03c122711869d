#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use video_notes_backend::api::error::AppError;
use video_notes_backend::config::AppConfig;
use video_notes_backend::models::{FileState, StagedMedia};
use video_notes_backend::services::analysis::AnalysisService;
use video_notes_backend::services::gemini::MediaProvider;
use video_notes_backend::services::scratch::ScratchStore;
use video_notes_backend::{AppState, create_app};

pub const BOUNDARY: &str = "---------------------------123456789012345678901234567";

/// Programmable provider double. Staging reports `initial_state`; each poll
/// pops one scripted state (pending once the script runs out); call counters
/// let tests assert on exactly-once cleanup and short-circuited generation.
pub struct FakeProvider {
    pub initial_state: FileState,
    pub poll_states: Mutex<VecDeque<FileState>>,
    pub markdown: String,
    pub generation_error: Option<String>,
    pub stage_calls: AtomicUsize,
    pub generate_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
}

impl FakeProvider {
    pub fn new(initial_state: FileState, markdown: &str) -> Self {
        Self {
            initial_state,
            poll_states: Mutex::new(VecDeque::new()),
            markdown: markdown.to_string(),
            generation_error: None,
            stage_calls: AtomicUsize::new(0),
            generate_calls: AtomicUsize::new(0),
            delete_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_poll_states(self, states: Vec<FileState>) -> Self {
        *self.poll_states.lock().unwrap() = states.into_iter().collect();
        self
    }

    /// Every generation call fails with the given provider message.
    pub fn with_generation_error(mut self, message: &str) -> Self {
        self.generation_error = Some(message.to_string());
        self
    }
}

#[async_trait]
impl MediaProvider for FakeProvider {
    async fn stage_file(
        &self,
        _path: &Path,
        mime_type: &str,
        display_name: &str,
    ) -> Result<StagedMedia, AppError> {
        self.stage_calls.fetch_add(1, Ordering::SeqCst);
        Ok(StagedMedia {
            name: format!("files/{}", display_name),
            uri: format!("https://files.test/{}", display_name),
            state: self.initial_state,
            mime_type: mime_type.to_string(),
        })
    }

    async fn file_state(&self, name: &str) -> Result<StagedMedia, AppError> {
        let state = self
            .poll_states
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(FileState::Pending);
        Ok(StagedMedia {
            name: name.to_string(),
            uri: format!("https://files.test/{}", name),
            state,
            mime_type: "video/mp4".to_string(),
        })
    }

    async fn generate_notes(
        &self,
        _media: &StagedMedia,
        _prompt: &str,
    ) -> Result<String, AppError> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        match &self.generation_error {
            Some(message) => Err(AppError::Generation(message.clone())),
            None => Ok(self.markdown.clone()),
        }
    }

    async fn delete_file(&self, _name: &str) -> Result<(), AppError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Fast polling so failure-path tests finish in well under a second.
pub fn test_config(scratch_root: &Path) -> AppConfig {
    AppConfig {
        scratch_dir: scratch_root.join("scratch"),
        poll_interval: Duration::from_millis(10),
        poll_timeout: Duration::from_millis(200),
        ..AppConfig::default()
    }
}

pub fn build_app(provider: Arc<FakeProvider>, config: AppConfig) -> axum::Router {
    let scratch = Arc::new(ScratchStore::new(&config.scratch_dir));
    let provider: Arc<dyn MediaProvider> = provider;
    let analysis = Arc::new(AnalysisService::new(
        provider,
        scratch.clone(),
        config.clone(),
    ));
    create_app(AppState {
        scratch,
        analysis,
        config,
    })
}

pub fn multipart_body(filename: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{BOUNDARY}\r\n\
        Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
        Content-Type: {content_type}\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn upload_request(filename: &str, content_type: &str, data: &[u8]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(filename, content_type, data)))
        .unwrap()
}

pub fn json_request(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| panic!("non-JSON body: {:?}", String::from_utf8_lossy(&bytes)));
    (status, json)
}

/// Uploads through the endpoint and returns the handle JSON.
pub async fn do_upload(
    app: &axum::Router,
    filename: &str,
    content_type: &str,
    data: &[u8],
) -> Value {
    let response = app
        .clone()
        .oneshot(upload_request(filename, content_type, data))
        .await
        .unwrap();
    let (status, json) = body_json(response).await;
    assert_eq!(status, StatusCode::OK, "upload failed: {:?}", json);
    json
}

/// Number of files currently in the scratch directory (0 when it was never
/// created).
pub fn scratch_file_count(config: &AppConfig) -> usize {
    std::fs::read_dir(&config.scratch_dir)
        .map(|entries| entries.count())
        .unwrap_or(0)
}
