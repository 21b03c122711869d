use crate::api::error::AppError;
use crate::models::{FileState, StagedMedia};
use crate::services::gemini::MediaProvider;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::{debug, warn};

/// Polls the provider until the staged file leaves the pending state.
///
/// `pending → active` resolves, `pending → failed` is an ingestion error, and
/// exceeding the wall-clock ceiling is a distinct timeout error. A transient
/// query failure consumes one interval but is not a state transition. Each
/// attempt is separated by the full interval; the wait suspends the calling
/// task only.
pub async fn await_active(
    provider: &dyn MediaProvider,
    media: StagedMedia,
    interval: Duration,
    timeout: Duration,
) -> Result<StagedMedia, AppError> {
    let deadline = Instant::now() + timeout;
    let mut current = media;

    loop {
        match current.state {
            FileState::Active => return Ok(current),
            FileState::Failed => {
                return Err(AppError::Ingestion(format!(
                    "provider reported staged file {} as failed",
                    current.name
                )));
            }
            FileState::Pending => {
                debug!("staged file {} still pending", current.name);
            }
        }

        if Instant::now() >= deadline {
            return Err(AppError::ProcessingTimeout(timeout));
        }

        sleep(interval).await;

        match provider.file_state(&current.name).await {
            Ok(next) => current = next,
            Err(e) => warn!("readiness poll for {} failed, retrying: {}", current.name, e),
        }
    }
}
