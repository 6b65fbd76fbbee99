// Seams between the sequencer and the outside world

use async_trait::async_trait;
use std::path::Path;
use tokio::sync::mpsc::UnboundedSender;

use super::errors::DownloadError;
use super::models::DownloadProgress;

/// Captured result of one external process
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessOutput {
    /// None when the process was killed by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs external tools (yt-dlp, ffmpeg, ffprobe)
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run `program` to completion. A non-zero exit is NOT an error here;
    /// errors mean the process could not be started, awaited or timed out.
    async fn run(
        &self,
        program: &Path,
        args: &[String],
        progress: &ProgressEmitter,
    ) -> Result<ProcessOutput, DownloadError>;
}

/// Progress emitter helper
///
/// Sends progress to whoever started the download (CLI printer, background
/// worker owner). A disabled emitter drops everything.
#[derive(Debug, Clone, Default)]
pub struct ProgressEmitter {
    sender: Option<UnboundedSender<DownloadProgress>>,
}

impl ProgressEmitter {
    pub fn new(sender: UnboundedSender<DownloadProgress>) -> Self {
        Self {
            sender: Some(sender),
        }
    }

    pub fn disabled() -> Self {
        Self { sender: None }
    }

    pub fn emit(&self, progress: DownloadProgress) {
        if let Some(sender) = &self.sender {
            // receiver gone means nobody is listening any more
            let _ = sender.send(progress);
        }
    }

    pub fn status(&self, percent: f32, status: impl Into<String>) {
        self.emit(DownloadProgress {
            percent,
            status: status.into(),
        });
    }
}
