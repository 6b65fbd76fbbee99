// Downloader module - yt-dlp/ffmpeg wrapper with per-platform fallback plans

pub mod command;
pub mod diagnostics;
pub mod errors;
pub mod format_selector;
pub mod models;
pub mod orchestrator;
pub mod platforms;
pub mod postprocess;
pub mod reporter;
pub mod sequencer;
pub mod stages;
pub mod tools;
pub mod traits;
pub mod utils;
pub mod validation;

#[cfg(test)]
pub(crate) mod testing;

pub use errors::DownloadError;
pub use models::{DownloadProgress, DownloadRequest, DownloadResult, NetworkConfig, Platform, Quality};
pub use orchestrator::{Downloader, DownloaderSettings};
pub use tools::{ResolvedTools, ToolManager, ToolPaths, ToolType};
pub use traits::{ProcessRunner, ProgressEmitter};
