use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Video container types the provider accepts for file staging.
pub const DEFAULT_VIDEO_TYPES: &[&str] = &[
    "video/mp4",
    "video/mpeg",
    "video/mpg",
    "video/mov",
    "video/quicktime",
    "video/webm",
    "video/wmv",
    "video/x-msvideo",
    "video/x-flv",
    "video/3gpp",
];

/// Runtime configuration for uploads, polling, and generation
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Maximum upload size in bytes (default: 200 MB)
    pub max_file_size: usize,

    /// MIME allow-list for uploads (default: provider-recognized video types)
    pub allowed_video_types: Vec<String>,

    /// Scratch directory for in-flight uploads (default: "uploads")
    pub scratch_dir: PathBuf,

    /// Interval between readiness polls (default: 5 s)
    pub poll_interval: Duration,

    /// Wall-clock ceiling for readiness polling (default: 300 s)
    pub poll_timeout: Duration,

    /// Generation model (default: "gemini-2.0-flash")
    pub model: String,

    /// Sampling temperature for generation (default: 0.3)
    pub temperature: f32,

    /// Output token ceiling for generation (default: 8192)
    pub max_output_tokens: u32,

    /// Deadline applied to every outbound provider call (default: 120 s)
    pub provider_request_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_file_size: 200 * 1024 * 1024, // 200 MB
            allowed_video_types: DEFAULT_VIDEO_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            scratch_dir: PathBuf::from("uploads"),
            poll_interval: Duration::from_secs(5),
            poll_timeout: Duration::from_secs(300),
            model: "gemini-2.0-flash".to_string(),
            temperature: 0.3,
            max_output_tokens: 8192,
            provider_request_timeout: Duration::from_secs(120),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            max_file_size: env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_file_size),

            allowed_video_types: env::var("ALLOWED_VIDEO_TYPES")
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_lowercase())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or(default.allowed_video_types),

            scratch_dir: env::var("SCRATCH_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.scratch_dir),

            poll_interval: env::var("POLL_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(default.poll_interval),

            poll_timeout: env::var("POLL_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(default.poll_timeout),

            model: env::var("GEMINI_MODEL").unwrap_or(default.model),

            temperature: env::var("GENERATION_TEMPERATURE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.temperature),

            max_output_tokens: env::var("MAX_OUTPUT_TOKENS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_output_tokens),

            provider_request_timeout: env::var("PROVIDER_REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(default.provider_request_timeout),
        }
    }

    /// Create config for development (small limits, fast polling)
    pub fn development() -> Self {
        Self {
            max_file_size: 50 * 1024 * 1024,
            poll_interval: Duration::from_secs(1),
            poll_timeout: Duration::from_secs(60),
            ..Self::default()
        }
    }
}
