// Common data models for downloader

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::stages::StageKind;

/// Supported source platforms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    YouTube,
    Facebook,
    Instagram,
    TikTok,
    Twitter,
}

impl Platform {
    pub const ALL: [Platform; 5] = [
        Platform::YouTube,
        Platform::Facebook,
        Platform::Instagram,
        Platform::TikTok,
        Platform::Twitter,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::YouTube => "YouTube",
            Self::Facebook => "Facebook",
            Self::Instagram => "Instagram",
            Self::TikTok => "TikTok",
            Self::Twitter => "Twitter/X",
        }
    }

    /// Folder created under the download root for this platform
    pub fn default_dir_name(&self) -> &'static str {
        match self {
            Self::YouTube => "YouTube_Videos",
            Self::Facebook => "Facebook_Videos",
            Self::Instagram => "Instagram_Videos",
            Self::TikTok => "TikTok_Videos",
            Self::Twitter => "Twitter_Videos",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "youtube" | "yt" => Ok(Self::YouTube),
            "facebook" | "fb" => Ok(Self::Facebook),
            "instagram" | "ig" => Ok(Self::Instagram),
            "tiktok" | "tt" => Ok(Self::TikTok),
            "twitter" | "x" => Ok(Self::Twitter),
            other => Err(format!("unknown platform '{}'", other)),
        }
    }
}

/// Quality preference, mapped to a yt-dlp format selector per platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    #[default]
    Best,
    /// At most 720p
    Medium,
    /// Smallest available, saves bandwidth
    Worst,
}

impl Quality {
    /// Map the interactive menu answer (1-3). Empty or unknown input means Best.
    pub fn from_menu_choice(choice: &str) -> Self {
        match choice.trim() {
            "2" => Self::Medium,
            "3" => Self::Worst,
            _ => Self::Best,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Best => "best",
            Self::Medium => "medium",
            Self::Worst => "worst",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Quality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "best" | "1" => Ok(Self::Best),
            "medium" | "720p" | "2" => Ok(Self::Medium),
            "worst" | "3" => Ok(Self::Worst),
            other => Err(format!("unknown quality '{}' (expected best, medium or worst)", other)),
        }
    }
}

/// One download invocation
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub url: String,
    pub quality: Quality,
    pub output_directory: PathBuf,
    /// Detected from the URL when not given
    pub platform: Option<Platform>,
}

impl DownloadRequest {
    pub fn new(url: impl Into<String>, quality: Quality, output_directory: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into().trim().to_string(),
            quality,
            output_directory: output_directory.into(),
            platform: None,
        }
    }

    pub fn with_platform(mut self, platform: Option<Platform>) -> Self {
        self.platform = platform;
        self
    }
}

/// Record of one fallback stage run
#[derive(Debug, Clone, Serialize)]
pub struct StageAttempt {
    pub stage: StageKind,
    pub success: bool,
    pub error: Option<String>,
}

/// Outcome handed back to the caller / printed to the console
#[derive(Debug, Clone, Default, Serialize)]
pub struct DownloadResult {
    pub success: bool,
    pub output_file_path: Option<PathBuf>,
    pub error_message: Option<String>,
    /// Stage that produced the file
    pub stage: Option<StageKind>,
    /// File is an approximation (TikTok watermark may remain or was cropped)
    pub best_effort: bool,
    pub file_size_bytes: Option<u64>,
    /// "WIDTHxHEIGHT" from ffprobe when available
    pub dimensions: Option<String>,
    pub metadata: Option<SidecarMetadata>,
    pub attempts: Vec<StageAttempt>,
}

impl DownloadResult {
    pub fn failure(message: impl Into<String>, attempts: Vec<StageAttempt>) -> Self {
        Self {
            success: false,
            error_message: Some(message.into()),
            attempts,
            ..Default::default()
        }
    }
}

/// Download progress information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadProgress {
    pub percent: f32,
    pub status: String,
}

/// Network / auth settings applied to every yt-dlp call
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Proxy URL (e.g., "socks5://127.0.0.1:1080")
    pub proxy: Option<String>,

    /// Socket timeout in seconds passed to yt-dlp
    pub socket_timeout: Option<u32>,

    /// Browser used by the cookie fallback stage
    pub cookies_browser: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            proxy: None,
            socket_timeout: None,
            cookies_browser: "chrome".to_string(),
        }
    }
}

/// Selected fields of the `.info.json` sidecar written by yt-dlp
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SidecarMetadata {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub uploader: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub upload_date: Option<String>,
    #[serde(default)]
    pub like_count: Option<u64>,
    #[serde(default)]
    pub comment_count: Option<u64>,
    #[serde(default)]
    pub duration: Option<f64>,
}

impl SidecarMetadata {
    /// Caption shortened to `max` characters
    pub fn caption_preview(&self, max: usize) -> Option<String> {
        self.description.as_ref().map(|d| {
            if d.chars().count() > max {
                let cut: String = d.chars().take(max).collect();
                format!("{}...", cut)
            } else {
                d.clone()
            }
        })
    }
}
