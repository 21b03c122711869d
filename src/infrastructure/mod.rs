use crate::config::AppConfig;
use crate::services::gemini::{GeminiClient, MediaProvider};
use crate::services::scratch::ScratchStore;
use anyhow::{Context, Result};
use std::env;
use std::sync::Arc;
use tracing::info;

/// Builds the Gemini-backed provider from the environment. The API key is a
/// startup requirement: a missing key aborts boot instead of failing requests.
pub fn setup_provider(config: &AppConfig) -> Result<Arc<dyn MediaProvider>> {
    let api_key = env::var("GEMINI_API_KEY").context("GEMINI_API_KEY must be set")?;

    info!("🤖 Provider: Gemini (model {})", config.model);
    Ok(Arc::new(GeminiClient::new(api_key, config)?))
}

pub fn setup_scratch(config: &AppConfig) -> Arc<ScratchStore> {
    info!("📁 Scratch directory: {}", config.scratch_dir.display());
    Arc::new(ScratchStore::new(&config.scratch_dir))
}
