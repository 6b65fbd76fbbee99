pub mod config;
pub mod downloader;
pub mod logging;

pub use config::AppConfig;
pub use downloader::{DownloadError, DownloadRequest, DownloadResult, Downloader, Platform, Quality};
