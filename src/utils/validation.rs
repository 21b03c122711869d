use anyhow::{Result, anyhow};
use std::path::Path;

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Validates file size against maximum limit
pub fn validate_file_size(size: usize, max_size: usize) -> Result<()> {
    if size > max_size {
        return Err(anyhow!(ValidationError {
            code: "FILE_TOO_LARGE",
            message: format!(
                "File size {} bytes exceeds maximum allowed {} bytes ({} MB)",
                size,
                max_size,
                max_size / 1024 / 1024
            ),
        }));
    }
    Ok(())
}

/// Validates MIME type against the configured video allowlist
pub fn validate_video_type(content_type: &str, allowed: &[String]) -> Result<()> {
    let normalized = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_lowercase();

    if allowed.iter().any(|a| a == &normalized) {
        return Ok(());
    }

    Err(anyhow!(ValidationError {
        code: "UNSUPPORTED_MEDIA_TYPE",
        message: format!(
            "MIME type '{}' is not a supported video container",
            content_type
        ),
    }))
}

/// Sanitizes the client-supplied filename to prevent path traversal and
/// injection. The scratch file itself is named from the upload UUID; this
/// only guards the display name echoed back to the caller.
pub fn sanitize_filename(filename: &str) -> Result<String> {
    let name = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    if name.is_empty() {
        return Err(anyhow!(ValidationError {
            code: "INVALID_FILENAME",
            message: "Filename cannot be empty".to_string(),
        }));
    }

    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        tracing::warn!("Path traversal attempt detected: {}", filename);
    }

    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_control()
                || c == '/'
                || c == '\\'
                || c == ':'
                || c == '*'
                || c == '?'
                || c == '"'
                || c == '<'
                || c == '>'
                || c == '|'
                || c == ';'
            {
                '_'
            } else {
                c
            }
        })
        .collect();

    // Limit length safely for UTF-8
    let sanitized = if sanitized.len() > 255 {
        let mut end = 255;
        while !sanitized.is_char_boundary(end) {
            end -= 1;
        }
        sanitized[..end].to_string()
    } else {
        sanitized
    };

    Ok(sanitized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_VIDEO_TYPES;

    fn allowed() -> Vec<String> {
        DEFAULT_VIDEO_TYPES.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_validate_file_size() {
        let max = 200 * 1024 * 1024;
        assert!(validate_file_size(1024, max).is_ok());
        assert!(validate_file_size(max, max).is_ok());
        assert!(validate_file_size(max + 1, max).is_err());
    }

    #[test]
    fn test_validate_video_type() {
        assert!(validate_video_type("video/mp4", &allowed()).is_ok());
        assert!(validate_video_type("video/quicktime", &allowed()).is_ok());
        assert!(validate_video_type("VIDEO/MP4; codecs=avc1", &allowed()).is_ok());

        // Non-video containers are rejected
        assert!(validate_video_type("image/png", &allowed()).is_err());
        assert!(validate_video_type("application/pdf", &allowed()).is_err());
        assert!(validate_video_type("text/plain", &allowed()).is_err());
        assert!(validate_video_type("application/octet-stream", &allowed()).is_err());
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("lecture.mp4").unwrap(), "lecture.mp4");
        assert_eq!(sanitize_filename("my talk.mov").unwrap(), "my talk.mov");
        assert_eq!(
            sanitize_filename("clip<script>.mp4").unwrap(),
            "clip_script_.mp4"
        );
        assert_eq!(sanitize_filename("日本語.mp4").unwrap(), "日本語.mp4");

        // Path traversal collapses to the final component
        assert_eq!(sanitize_filename("../../../etc/passwd").unwrap(), "passwd");

        assert!(sanitize_filename("").is_err());
        assert!(sanitize_filename("..").is_err());
    }
}
