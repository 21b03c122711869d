mod common;

use axum::http::StatusCode;
use common::*;
use std::path::Path;
use std::sync::Arc;
use tower::ServiceExt;
use video_notes_backend::models::FileState;

#[tokio::test]
async fn upload_accepts_video_and_reports_real_size() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let provider = Arc::new(FakeProvider::new(FileState::Active, "## Summary"));
    let app = build_app(provider, config.clone());

    let data = vec![0x42u8; 50_000];
    let response = app
        .oneshot(upload_request("lecture.mp4", "video/mp4", &data))
        .await
        .unwrap();
    let (status, json) = body_json(response).await;

    assert_eq!(status, StatusCode::OK, "{:?}", json);
    assert_eq!(json["size"], 50_000);
    assert_eq!(json["fileName"], "lecture.mp4");
    assert_eq!(json["mimeType"], "video/mp4");
    assert!(!json["uploadId"].as_str().unwrap().is_empty());

    // Declared size matches the bytes actually on disk
    let path = Path::new(json["filePath"].as_str().unwrap());
    assert!(path.starts_with(&config.scratch_dir));
    assert_eq!(std::fs::metadata(path).unwrap().len(), 50_000);
}

#[tokio::test]
async fn upload_rejects_unsupported_type_and_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let provider = Arc::new(FakeProvider::new(FileState::Active, ""));
    let app = build_app(provider, config.clone());

    // 5 MB payload declared as an unsupported container
    let data = vec![0u8; 5 * 1024 * 1024];
    let response = app
        .oneshot(upload_request("notes.txt", "text/plain", &data))
        .await
        .unwrap();
    let (status, json) = body_json(response).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        json["error"]
            .as_str()
            .unwrap()
            .contains("not a supported video container"),
        "{:?}",
        json
    );
    assert_eq!(scratch_file_count(&config), 0);
}

#[tokio::test]
async fn upload_rejects_oversized_file_and_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.max_file_size = 1024;
    let provider = Arc::new(FakeProvider::new(FileState::Active, ""));
    let app = build_app(provider, config.clone());

    let data = vec![0u8; 5000];
    let response = app
        .oneshot(upload_request("big.mp4", "video/mp4", &data))
        .await
        .unwrap();
    let (status, json) = body_json(response).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        json["error"].as_str().unwrap().contains("exceeds maximum"),
        "{:?}",
        json
    );
    assert_eq!(scratch_file_count(&config), 0);
}

#[tokio::test]
async fn upload_requires_a_file_field() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let provider = Arc::new(FakeProvider::new(FileState::Active, ""));
    let app = build_app(provider, config);

    let body = format!(
        "--{BOUNDARY}\r\n\
        Content-Disposition: form-data; name=\"comment\"\r\n\r\n\
        just text\r\n\
        --{BOUNDARY}--\r\n"
    );
    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(axum::body::Body::from(body))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let (status, json) = body_json(response).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("file"));
}
