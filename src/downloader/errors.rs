// Error types for the download pipeline

use std::path::PathBuf;

use thiserror::Error;

use super::models::Platform;
use super::stages::StageKind;

#[derive(Debug, Error)]
pub enum DownloadError {
    /// URL does not match any known shape for the platform.
    /// Raised before any subprocess is started.
    #[error("Invalid {platform} URL: {url}")]
    InvalidUrl { platform: Platform, url: String },

    /// URL does not belong to any supported platform
    #[error("Unsupported URL (not YouTube, Facebook, Instagram, TikTok or Twitter/X): {0}")]
    UnsupportedUrl(String),

    /// yt-dlp / ffmpeg / ffprobe could not be located
    #[error("Tool not found: {tool}. {hint}")]
    ToolNotFound { tool: String, hint: String },

    /// Process could not be spawned or awaited
    #[error("Execution error: {0}")]
    ExecutionError(String),

    /// Process exceeded the configured timeout and was killed
    #[error("{program} timed out after {seconds}s")]
    Timeout { program: String, seconds: u64 },

    /// A single fallback stage exited non-zero
    #[error("Stage '{stage}' failed (exit code {code:?}): {stderr}")]
    StageFailed {
        stage: StageKind,
        code: Option<i32>,
        stderr: String,
    },

    /// Every fallback stage failed; carries the last stage's error text
    #[error("All {attempts} download strategies failed. Last error: {last_error}")]
    StrategiesExhausted { attempts: usize, last_error: String },

    /// ffmpeg post-processing failed (watermark crop)
    #[error("Post-processing failed: {0}")]
    PostProcess(String),

    #[error("Invalid configuration at {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DownloadError {
    pub fn tool_not_found(tool: &str) -> Self {
        let hint = match tool {
            "yt-dlp" => "Install it (pip install -U yt-dlp, brew install yt-dlp) or set SOCIAL_DL_YTDLP",
            "ffmpeg" => "Install it (apt install ffmpeg, brew install ffmpeg) or set SOCIAL_DL_FFMPEG",
            "ffprobe" => "ffprobe ships with ffmpeg; install ffmpeg or set SOCIAL_DL_FFPROBE",
            _ => "Install it and make sure it is in PATH",
        };
        Self::ToolNotFound {
            tool: tool.to_string(),
            hint: hint.to_string(),
        }
    }

    /// Text that describes why a stage failed, used as the "last error"
    /// once the sequence is exhausted.
    pub fn stage_error_text(&self) -> String {
        match self {
            Self::StageFailed { stderr, .. } if !stderr.trim().is_empty() => {
                important_lines(stderr)
            }
            other => other.to_string(),
        }
    }

    /// Errors that end the whole download instead of moving to the next stage
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::InvalidUrl { .. } | Self::UnsupportedUrl(_) | Self::ToolNotFound { .. }
        )
    }
}

/// Keep the lines of yt-dlp stderr that explain the failure
fn important_lines(stderr: &str) -> String {
    let picked: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|l| l.starts_with("ERROR:") || l.contains("HTTP Error"))
        .collect();

    if picked.is_empty() {
        stderr.trim().to_string()
    } else {
        picked.join("\n")
    }
}

pub type Result<T> = std::result::Result<T, DownloadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_error_text_prefers_error_lines() {
        let err = DownloadError::StageFailed {
            stage: StageKind::Direct,
            code: Some(1),
            stderr: "[facebook] 123: Downloading webpage\nERROR: [facebook] 123: Cannot parse data\n"
                .to_string(),
        };
        assert_eq!(
            err.stage_error_text(),
            "ERROR: [facebook] 123: Cannot parse data"
        );
    }

    #[test]
    fn test_stage_error_text_falls_back_to_display() {
        let err = DownloadError::Timeout {
            program: "yt-dlp".to_string(),
            seconds: 5,
        };
        assert_eq!(err.stage_error_text(), "yt-dlp timed out after 5s");
    }

    #[test]
    fn test_fatal_classification() {
        assert!(DownloadError::tool_not_found("yt-dlp").is_fatal());
        assert!(!DownloadError::PostProcess("crop".into()).is_fatal());
    }
}
