use crate::api::error::AppError;
use crate::config::AppConfig;
use crate::models::{FileState, StagedMedia};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::path::Path;
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Staging, readiness queries, generation and deletion against the external
/// media-understanding provider. Behind a trait so the orchestrator takes an
/// injected instance and tests substitute a fake without global state.
#[async_trait]
pub trait MediaProvider: Send + Sync {
    /// Uploads a local file to the provider's file-staging endpoint.
    async fn stage_file(
        &self,
        path: &Path,
        mime_type: &str,
        display_name: &str,
    ) -> Result<StagedMedia, AppError>;

    /// Queries the current processing state of a staged file.
    async fn file_state(&self, name: &str) -> Result<StagedMedia, AppError>;

    /// Issues exactly one generation call against the active staged file.
    async fn generate_notes(&self, media: &StagedMedia, prompt: &str)
    -> Result<String, AppError>;

    /// Requests deletion of a staged file.
    async fn delete_file(&self, name: &str) -> Result<(), AppError>;
}

/// Gemini implementation over the Files API and `generateContent`.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    max_output_tokens: u32,
}

impl GeminiClient {
    /// The shared client carries an explicit request deadline so a hung
    /// provider call cannot stall a request forever.
    pub fn new(api_key: String, config: &AppConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.provider_request_timeout)
            .build()
            .context("failed to build provider HTTP client")?;

        Ok(Self {
            http,
            api_key,
            base_url: GEMINI_BASE_URL.to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        })
    }
}

#[async_trait]
impl MediaProvider for GeminiClient {
    async fn stage_file(
        &self,
        path: &Path,
        mime_type: &str,
        display_name: &str,
    ) -> Result<StagedMedia, AppError> {
        let size = tokio::fs::metadata(path)
            .await
            .map_err(|e| AppError::Storage(format!("cannot stat {}: {}", path.display(), e)))?
            .len();

        // Resumable upload, step 1: reserve an upload URL.
        let start = self
            .http
            .post(format!(
                "{}/upload/v1beta/files?key={}",
                self.base_url, self.api_key
            ))
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", size)
            .header("X-Goog-Upload-Header-Content-Type", mime_type)
            .json(&json!({ "file": { "display_name": display_name } }))
            .send()
            .await
            .map_err(|e| AppError::Ingestion(format!("staging start failed: {}", e)))?;

        if !start.status().is_success() {
            return Err(AppError::Ingestion(format!(
                "staging start returned {}: {}",
                start.status(),
                start.text().await.unwrap_or_default()
            )));
        }

        let upload_url = start
            .headers()
            .get("x-goog-upload-url")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Ingestion("staging start response missing upload URL".to_string())
            })?
            .to_string();

        // Step 2: stream the file body and finalize.
        let file = tokio::fs::File::open(path)
            .await
            .map_err(|e| AppError::Storage(format!("cannot open {}: {}", path.display(), e)))?;
        let body = reqwest::Body::wrap_stream(ReaderStream::new(file));

        let resp = self
            .http
            .post(&upload_url)
            .header("Content-Length", size)
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(body)
            .send()
            .await
            .map_err(|e| AppError::Ingestion(format!("staging upload failed: {}", e)))?;

        if !resp.status().is_success() {
            return Err(AppError::Ingestion(format!(
                "staging upload returned {}: {}",
                resp.status(),
                resp.text().await.unwrap_or_default()
            )));
        }

        let json: Value = resp
            .json()
            .await
            .map_err(|e| AppError::Ingestion(format!("malformed staging response: {}", e)))?;

        let staged = parse_staged(&json["file"])
            .ok_or_else(|| AppError::Ingestion("malformed staging response".to_string()))?;
        info!(
            "staged {} as {} (state {:?})",
            display_name, staged.name, staged.state
        );
        Ok(staged)
    }

    async fn file_state(&self, name: &str) -> Result<StagedMedia, AppError> {
        let resp = self
            .http
            .get(format!("{}/v1beta/{}?key={}", self.base_url, name, self.api_key))
            .send()
            .await
            .map_err(|e| AppError::Ingestion(format!("state query failed: {}", e)))?;

        if !resp.status().is_success() {
            return Err(AppError::Ingestion(format!(
                "state query returned {}: {}",
                resp.status(),
                resp.text().await.unwrap_or_default()
            )));
        }

        let json: Value = resp
            .json()
            .await
            .map_err(|e| AppError::Ingestion(format!("malformed state response: {}", e)))?;

        parse_staged(&json)
            .ok_or_else(|| AppError::Ingestion("malformed state response".to_string()))
    }

    async fn generate_notes(
        &self,
        media: &StagedMedia,
        prompt: &str,
    ) -> Result<String, AppError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );
        let body = json!({
            "contents": [{ "parts": [
                { "text": prompt },
                { "file_data": { "mime_type": media.mime_type, "file_uri": media.uri } }
            ]}],
            "generationConfig": {
                "temperature": self.temperature,
                "maxOutputTokens": self.max_output_tokens
            }
        });

        let resp = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Generation(format!("generation call failed: {}", e)))?;

        if !resp.status().is_success() {
            return Err(AppError::Generation(format!(
                "generation returned {}: {}",
                resp.status(),
                resp.text().await.unwrap_or_default()
            )));
        }

        let json: Value = resp
            .json()
            .await
            .map_err(|e| AppError::Generation(format!("malformed generation response: {}", e)))?;

        if let Some(reason) = json["promptFeedback"]["blockReason"].as_str() {
            return Err(AppError::Generation(format!(
                "blocked by safety filter: {}",
                reason
            )));
        }

        Ok(extract_text(&json))
    }

    async fn delete_file(&self, name: &str) -> Result<(), AppError> {
        debug!("deleting staged file {}", name);
        let resp = self
            .http
            .delete(format!("{}/v1beta/{}?key={}", self.base_url, name, self.api_key))
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("remote delete failed: {}", e)))?;

        if !resp.status().is_success() {
            return Err(AppError::Internal(format!(
                "remote delete returned {}",
                resp.status()
            )));
        }
        Ok(())
    }
}

/// Maps a Files API resource object onto `StagedMedia`. The provider reports
/// `PROCESSING` until the file is usable; anything unrecognized stays pending
/// so the poller keeps asking instead of failing on a new state string.
fn parse_staged(value: &Value) -> Option<StagedMedia> {
    let name = value["name"].as_str()?.to_string();
    let state = match value["state"].as_str() {
        Some("ACTIVE") => FileState::Active,
        Some("FAILED") => FileState::Failed,
        _ => FileState::Pending,
    };

    Some(StagedMedia {
        name,
        uri: value["uri"].as_str().unwrap_or_default().to_string(),
        state,
        mime_type: value["mimeType"].as_str().unwrap_or_default().to_string(),
    })
}

/// Concatenates the text parts of the first candidate. Empty when the model
/// produced no text.
fn extract_text(json: &Value) -> String {
    json["candidates"][0]["content"]["parts"]
        .as_array()
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p["text"].as_str())
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default()
}
