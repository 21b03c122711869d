use anyhow::{Context, Result};
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

/// Local scratch storage for in-flight uploads.
///
/// Every file is named from its upload UUID, so concurrent requests never
/// collide and no locking is needed. Files live only for the span of one
/// upload-then-analyze cycle; the orchestrator removes them afterwards.
pub struct ScratchStore {
    root: PathBuf,
}

impl ScratchStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes the payload under a name derived from the upload id, creating
    /// the scratch directory on demand. Returns the path of the new file.
    pub async fn save(&self, id: Uuid, original_name: &str, data: &[u8]) -> Result<PathBuf> {
        fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("failed to create scratch dir {}", self.root.display()))?;

        let path = self.root.join(scratch_name(id, original_name));
        fs::write(&path, data)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;

        Ok(path)
    }

    pub async fn exists(&self, path: &Path) -> bool {
        fs::try_exists(path).await.unwrap_or(false)
    }

    /// Removes a scratch file. Missing files are fine; the goal is that the
    /// file is gone afterwards.
    pub async fn remove(&self, path: &Path) -> Result<()> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("failed to remove {}", path.display())),
        }
    }

    /// True when `path` points inside the scratch directory without any
    /// parent-dir escapes. Callers replaying handles cannot reach other files.
    pub fn contains(&self, path: &Path) -> bool {
        path.starts_with(&self.root)
            && !path
                .components()
                .any(|c| matches!(c, Component::ParentDir))
    }
}

/// `<uuid>.<ext>` when the original name carries a plausible extension,
/// bare `<uuid>` otherwise.
fn scratch_name(id: Uuid, original_name: &str) -> String {
    match Path::new(original_name).extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()) => {
            format!("{}.{}", id, ext.to_lowercase())
        }
        _ => id.to_string(),
    }
}
