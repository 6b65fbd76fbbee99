// Application configuration (JSON file + environment overrides)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::downloader::errors::{DownloadError, Result};
use crate::downloader::models::{NetworkConfig, Platform};
use crate::downloader::orchestrator::DownloaderSettings;
use crate::downloader::reporter::{RECENT_WINDOW, SIDECAR_WINDOW};
use crate::downloader::tools::{ToolInfo, ToolManager, ToolPaths};

const APP_DIR: &str = "social-downloader";
const CONFIG_FILE: &str = "config.json";
const LOG_DIR_NAME: &str = "VideoDownloader_Logs";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Parent of the per-platform folders (default: ~/Downloads)
    pub download_root: Option<PathBuf>,
    /// Where log files go (default: <download_root>/VideoDownloader_Logs)
    pub log_dir: Option<PathBuf>,
    /// Explicit tool binaries
    pub tools: ToolPaths,
    /// Local directory searched for binaries before the system paths
    pub bin_dir: Option<PathBuf>,
    /// Browser for the cookie fallback stage
    pub cookies_browser: String,
    /// Proxy URL passed to yt-dlp and the HTTP client
    pub proxy: Option<String>,
    /// yt-dlp --socket-timeout
    pub socket_timeout_secs: Option<u32>,
    /// Kill a tool process after this many seconds
    pub process_timeout_secs: Option<u64>,
    pub recent_window_secs: u64,
    pub sidecar_window_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            download_root: None,
            log_dir: None,
            tools: ToolPaths::default(),
            bin_dir: None,
            cookies_browser: NetworkConfig::default().cookies_browser,
            proxy: None,
            socket_timeout_secs: None,
            process_timeout_secs: None,
            recent_window_secs: RECENT_WINDOW.as_secs(),
            sidecar_window_secs: SIDECAR_WINDOW.as_secs(),
        }
    }
}

impl AppConfig {
    /// `<config_dir>/social-downloader/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Load the explicit path (must exist) or the default path (optional),
    /// then apply environment overrides.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(DownloadError::Config {
                        path: path.to_path_buf(),
                        message: "file does not exist".to_string(),
                    });
                }
                Self::load_from(path)?
            }
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::load_from(&path)?,
                _ => Self::default(),
            },
        };
        config.tools.apply_env();
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let parsed: AppConfig = serde_json::from_slice(&bytes).map_err(|e| DownloadError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(parsed)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, format!("{json}\n"))?;
        Ok(())
    }

    /// Pin the located binaries so later runs skip the search.
    /// Returns how many paths changed.
    pub fn remember_tools(&mut self, tools: &[ToolInfo]) -> usize {
        let mut changed = 0;
        for info in tools {
            if let Some(path) = &info.path {
                if self.tools.get(info.tool_type) != Some(path.as_path()) {
                    self.tools.set(info.tool_type, path.clone());
                    changed += 1;
                }
            }
        }
        changed
    }

    pub fn download_root(&self) -> PathBuf {
        if let Some(root) = &self.download_root {
            return root.clone();
        }
        dirs::download_dir()
            .or_else(|| dirs::home_dir().map(|h| h.join("Downloads")))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Default output folder for a platform, e.g. ~/Downloads/TikTok_Videos
    pub fn platform_dir(&self, platform: Platform) -> PathBuf {
        self.download_root().join(platform.default_dir_name())
    }

    pub fn log_dir(&self) -> PathBuf {
        self.log_dir
            .clone()
            .unwrap_or_else(|| self.download_root().join(LOG_DIR_NAME))
    }

    /// `bin_dir`, or `<config_dir>/social-downloader/bin`
    pub fn bin_dir(&self) -> Option<PathBuf> {
        self.bin_dir
            .clone()
            .or_else(|| dirs::config_dir().map(|d| d.join(APP_DIR).join("bin")))
    }

    pub fn network(&self) -> NetworkConfig {
        NetworkConfig {
            proxy: self.proxy.clone(),
            socket_timeout: self.socket_timeout_secs,
            cookies_browser: self.cookies_browser.clone(),
        }
    }

    pub fn downloader_settings(&self) -> DownloaderSettings {
        DownloaderSettings {
            network: self.network(),
            allow_fallback: true,
            process_timeout_secs: self.process_timeout_secs,
            recent_window: Duration::from_secs(self.recent_window_secs),
            sidecar_window: Duration::from_secs(self.sidecar_window_secs),
        }
    }

    pub fn tool_manager(&self) -> ToolManager {
        ToolManager::new(self.tools.clone(), self.bin_dir())
    }
}
