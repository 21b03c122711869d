use crate::api::error::AppError;
use crate::config::AppConfig;
use crate::models::AnalysisResult;
use crate::services::gemini::MediaProvider;
use crate::services::poller::await_active;
use crate::services::scratch::ScratchStore;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tracing::{info, warn};
use uuid::Uuid;

/// Instruction template sent with every generation call.
const NOTES_PROMPT: &str = "You are given a lecture or tutorial video. Produce structured \
educational notes in markdown. Start with a '## Summary' section, then '## Key Concepts' \
as bullet points, then concise section-by-section notes under their own headings. Finish \
with a short '## Quiz' of 3 to 5 questions and an '## Answer Key'. Respond with markdown \
only, no preamble.";

/// Sequences staging, readiness polling, and generation for one upload, and
/// releases the scratch file plus any staged remote file on every exit path.
pub struct AnalysisService {
    provider: Arc<dyn MediaProvider>,
    scratch: Arc<ScratchStore>,
    config: AppConfig,
}

impl AnalysisService {
    pub fn new(
        provider: Arc<dyn MediaProvider>,
        scratch: Arc<ScratchStore>,
        config: AppConfig,
    ) -> Self {
        Self {
            provider,
            scratch,
            config,
        }
    }

    /// Runs the full pipeline for one handle.
    ///
    /// The teardown guard is armed before the first provider call: on a
    /// normal exit it runs in-line before the result is returned, and if the
    /// surrounding request is aborted mid-pipeline (client disconnect drops
    /// this future, cancelling the poll sleep) its `Drop` hands the same
    /// teardown to a detached task. Either way both releases happen, stay
    /// independent of each other, and never reach the caller.
    pub async fn analyze(
        &self,
        upload_id: Uuid,
        file_path: &Path,
        mime_type: &str,
    ) -> Result<AnalysisResult, AppError> {
        let staged_name: Arc<OnceLock<String>> = Arc::new(OnceLock::new());
        let mut guard = CleanupGuard::arm(
            self.provider.clone(),
            self.scratch.clone(),
            file_path.to_path_buf(),
            staged_name.clone(),
        );

        let result = self
            .run_pipeline(upload_id, file_path, mime_type, &staged_name)
            .await;

        if let Some(teardown) = guard.disarm() {
            teardown.run().await;
        }

        result
    }

    async fn run_pipeline(
        &self,
        upload_id: Uuid,
        file_path: &Path,
        mime_type: &str,
        staged_name: &OnceLock<String>,
    ) -> Result<AnalysisResult, AppError> {
        // A replayed handle whose scratch file was already cleaned up fails
        // here, before any provider call.
        if !self.scratch.exists(file_path).await {
            return Err(AppError::SourceMissing(format!(
                "no uploaded file at {}",
                file_path.display()
            )));
        }

        let display_name = format!("upload-{}", upload_id);
        let media = self
            .provider
            .stage_file(file_path, mime_type, &display_name)
            .await?;
        let _ = staged_name.set(media.name.clone());

        let media = await_active(
            self.provider.as_ref(),
            media,
            self.config.poll_interval,
            self.config.poll_timeout,
        )
        .await?;

        let markdown = self.provider.generate_notes(&media, NOTES_PROMPT).await?;
        info!(
            "generated {} bytes of markdown for upload {}",
            markdown.len(),
            upload_id
        );

        Ok(AnalysisResult {
            markdown,
            upload_id,
        })
    }
}

/// The two resource releases for one analysis attempt: remote delete of the
/// staged file (if staging got that far) and local delete of the scratch
/// file. Failures are logged, never raised; one failing does not stop the
/// other.
struct CleanupTask {
    provider: Arc<dyn MediaProvider>,
    scratch: Arc<ScratchStore>,
    file_path: PathBuf,
    staged_name: Arc<OnceLock<String>>,
}

impl CleanupTask {
    async fn run(self) {
        if let Some(name) = self.staged_name.get() {
            if let Err(e) = self.provider.delete_file(name).await {
                warn!("failed to delete staged file {}: {}", name, e);
            }
        }
        if let Err(e) = self.scratch.remove(&self.file_path).await {
            warn!(
                "failed to delete scratch file {}: {}",
                self.file_path.display(),
                e
            );
        }
    }
}

/// Guarantees the teardown runs exactly once, whether the pipeline finishes
/// or its future is dropped mid-flight.
struct CleanupGuard {
    task: Option<CleanupTask>,
}

impl CleanupGuard {
    fn arm(
        provider: Arc<dyn MediaProvider>,
        scratch: Arc<ScratchStore>,
        file_path: PathBuf,
        staged_name: Arc<OnceLock<String>>,
    ) -> Self {
        Self {
            task: Some(CleanupTask {
                provider,
                scratch,
                file_path,
                staged_name,
            }),
        }
    }

    fn disarm(&mut self) -> Option<CleanupTask> {
        self.task.take()
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            // The request was aborted mid-pipeline; finish teardown off-task.
            tokio::spawn(task.run());
        }
    }
}
