// Fallback stage definitions
//
// A platform plan is an ordered list of stages. Each stage is one attempt
// that differs from the previous one in URL form, headers or format selector.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// Computed format string plus anti-restriction flags
    Direct,
    /// Same invocation plus a browser cookie source
    WithCookies,
    /// Same invocation against the platform's mobile subdomain
    MobileUrl,
    /// Simplest format selector, certificate validation disabled
    BasicFormat,
    /// TikTok only: watermarked download followed by an ffmpeg crop
    WatermarkCrop,
}

impl StageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::WithCookies => "with-cookies",
            Self::MobileUrl => "mobile-url",
            Self::BasicFormat => "basic-format",
            Self::WatermarkCrop => "watermark-crop",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StageAction {
    /// Single yt-dlp invocation; success is a zero exit status
    YtDlp { args: Vec<String> },
    /// Download a watermarked copy to `temp_file`, then crop it into `output_file`
    WatermarkCrop {
        download_args: Vec<String>,
        temp_file: PathBuf,
        output_file: PathBuf,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    pub kind: StageKind,
    pub action: StageAction,
    /// Output is an approximation (watermark may remain or was cropped away)
    pub best_effort: bool,
}

impl Stage {
    pub fn ytdlp(kind: StageKind, args: Vec<String>) -> Self {
        Self {
            kind,
            action: StageAction::YtDlp { args },
            best_effort: false,
        }
    }

    pub fn best_effort(mut self) -> Self {
        self.best_effort = true;
        self
    }

    /// yt-dlp arguments of the stage (the download half for crop stages)
    pub fn ytdlp_args(&self) -> &[String] {
        match &self.action {
            StageAction::YtDlp { args } => args,
            StageAction::WatermarkCrop { download_args, .. } => download_args,
        }
    }

    /// URL the stage downloads from (always the last yt-dlp argument)
    pub fn target_url(&self) -> Option<&str> {
        self.ytdlp_args().last().map(String::as_str)
    }
}
