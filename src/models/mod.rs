use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// A file accepted by the upload endpoint, waiting to be analyzed.
///
/// The scratch file behind `file_path` exists from upload until the analysis
/// attempt completes; the orchestrator removes it on every exit path.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadHandle {
    pub upload_id: Uuid,
    /// Server-relative path inside the scratch directory.
    pub file_path: String,
    /// Original client-supplied name, sanitized.
    pub file_name: String,
    pub mime_type: String,
    pub size: u64,
}

/// Processing state reported by the provider for a staged file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileState {
    Pending,
    Active,
    Failed,
}

/// The upload once handed to the external provider's file-staging API.
#[derive(Debug, Clone)]
pub struct StagedMedia {
    /// Provider-assigned resource name (e.g. `files/abc123`).
    pub name: String,
    /// Provider-assigned access URI, referenced by the generation call.
    pub uri: String,
    pub state: FileState,
    pub mime_type: String,
}

/// Output of one successful analysis run. Held in the response cycle only.
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    /// Generated markdown. May be empty if the model returned nothing.
    pub markdown: String,
    pub upload_id: Uuid,
}
