use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Command;

use super::errors::{DownloadError, Result};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ToolType {
    YtDlp,
    Ffmpeg,
    Ffprobe,
}

impl ToolType {
    pub const ALL: [ToolType; 3] = [ToolType::YtDlp, ToolType::Ffmpeg, ToolType::Ffprobe];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolType::YtDlp => "yt-dlp",
            ToolType::Ffmpeg => "ffmpeg",
            ToolType::Ffprobe => "ffprobe",
        }
    }

    pub fn binary_name(&self) -> String {
        if cfg!(windows) {
            format!("{}.exe", self.as_str())
        } else {
            self.as_str().to_string()
        }
    }

    /// Environment variable that points at an explicit binary
    pub fn env_var(&self) -> &'static str {
        match self {
            ToolType::YtDlp => "SOCIAL_DL_YTDLP",
            ToolType::Ffmpeg => "SOCIAL_DL_FFMPEG",
            ToolType::Ffprobe => "SOCIAL_DL_FFPROBE",
        }
    }
}

/// Explicit binary locations (config file and environment)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolPaths {
    pub yt_dlp: Option<PathBuf>,
    pub ffmpeg: Option<PathBuf>,
    pub ffprobe: Option<PathBuf>,
}

impl ToolPaths {
    pub fn get(&self, tool: ToolType) -> Option<&Path> {
        match tool {
            ToolType::YtDlp => self.yt_dlp.as_deref(),
            ToolType::Ffmpeg => self.ffmpeg.as_deref(),
            ToolType::Ffprobe => self.ffprobe.as_deref(),
        }
    }

    pub fn set(&mut self, tool: ToolType, path: PathBuf) {
        match tool {
            ToolType::YtDlp => self.yt_dlp = Some(path),
            ToolType::Ffmpeg => self.ffmpeg = Some(path),
            ToolType::Ffprobe => self.ffprobe = Some(path),
        }
    }

    /// Environment variables win over values from the config file
    pub fn apply_env(&mut self) {
        for tool in ToolType::ALL {
            if let Ok(value) = std::env::var(tool.env_var()) {
                if !value.trim().is_empty() {
                    self.set(tool, PathBuf::from(value.trim()));
                }
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub tool_type: ToolType,
    pub version: Option<String>,
    pub path: Option<PathBuf>,
    pub is_available: bool,
}

/// Binaries a download needs. ffprobe is optional: without it the
/// dimension probe is skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTools {
    pub yt_dlp: PathBuf,
    pub ffmpeg: PathBuf,
    pub ffprobe: Option<PathBuf>,
}

pub struct ToolManager {
    overrides: ToolPaths,
    bin_dir: Option<PathBuf>,
    common_dirs: Vec<PathBuf>,
    path_lookup: bool,
}

impl ToolManager {
    pub fn new(overrides: ToolPaths, bin_dir: Option<PathBuf>) -> Self {
        Self {
            overrides,
            bin_dir,
            common_dirs: default_common_dirs(),
            path_lookup: true,
        }
    }

    pub fn with_common_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.common_dirs = dirs;
        self
    }

    /// Skip the `which` lookup (tests, sandboxed runs)
    pub fn without_path_lookup(mut self) -> Self {
        self.path_lookup = false;
        self
    }

    pub fn get_tool_info(&self, tool_type: ToolType) -> ToolInfo {
        let path = self.locate(tool_type);
        let version = path.as_deref().and_then(|p| self.get_version(p, tool_type));

        ToolInfo {
            name: tool_type.as_str().to_string(),
            tool_type,
            version,
            is_available: path.is_some(),
            path,
        }
    }

    pub fn get_all_tools(&self) -> Vec<ToolInfo> {
        ToolType::ALL.iter().map(|t| self.get_tool_info(*t)).collect()
    }

    /// Locate everything a download needs; a missing yt-dlp or ffmpeg is fatal
    pub fn resolve(&self) -> Result<ResolvedTools> {
        let yt_dlp = self
            .locate(ToolType::YtDlp)
            .ok_or_else(|| DownloadError::tool_not_found(ToolType::YtDlp.as_str()))?;
        let ffmpeg = self
            .locate(ToolType::Ffmpeg)
            .ok_or_else(|| DownloadError::tool_not_found(ToolType::Ffmpeg.as_str()))?;
        let ffprobe = self.locate(ToolType::Ffprobe);
        if ffprobe.is_none() {
            tracing::warn!("ffprobe not found, video dimensions will not be reported");
        }

        tracing::debug!(
            yt_dlp = %yt_dlp.display(),
            ffmpeg = %ffmpeg.display(),
            "tools resolved"
        );

        Ok(ResolvedTools {
            yt_dlp,
            ffmpeg,
            ffprobe,
        })
    }

    /// Lookup order: explicit override, local bin dir, common install
    /// locations, then PATH
    pub fn locate(&self, tool_type: ToolType) -> Option<PathBuf> {
        if let Some(path) = self.overrides.get(tool_type) {
            if path.is_file() {
                return Some(path.to_path_buf());
            }
            tracing::warn!(
                tool = tool_type.as_str(),
                path = %path.display(),
                "configured tool path does not exist, searching elsewhere"
            );
        }

        let binary_name = tool_type.binary_name();

        // 1. Local bin directory next to the config
        if let Some(dir) = &self.bin_dir {
            let candidate = dir.join(&binary_name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }

        // 2. Try common paths
        for dir in &self.common_dirs {
            let candidate = dir.join(&binary_name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }

        // 3. Try PATH
        if self.path_lookup {
            let finder = if cfg!(windows) { "where" } else { "which" };
            if let Ok(output) = Command::new(finder).arg(&binary_name).output() {
                if output.status.success() {
                    let found = String::from_utf8_lossy(&output.stdout);
                    if let Some(first) = found.lines().next().map(str::trim).filter(|l| !l.is_empty()) {
                        return Some(PathBuf::from(first));
                    }
                }
            }
        }

        None
    }

    fn get_version(&self, path: &Path, tool_type: ToolType) -> Option<String> {
        let arg = match tool_type {
            ToolType::YtDlp => "--version",
            // ffmpeg/ffprobe use a single dash
            ToolType::Ffmpeg | ToolType::Ffprobe => "-version",
        };

        match Command::new(path).arg(arg).output() {
            Ok(output) if output.status.success() => {
                let out = String::from_utf8_lossy(&output.stdout);
                // ffmpeg prints a banner; the first line holds the version
                out.lines().next().map(|l| l.trim().to_string())
            }
            _ => None,
        }
    }
}

fn default_common_dirs() -> Vec<PathBuf> {
    let mut dirs_list = vec![
        PathBuf::from("/opt/homebrew/bin"),
        PathBuf::from("/usr/local/bin"),
        PathBuf::from("/usr/bin"),
    ];
    if let Some(home) = dirs::home_dir() {
        dirs_list.push(home.join(".local").join("bin"));
    }
    dirs_list
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn isolated(overrides: ToolPaths, bin_dir: Option<PathBuf>) -> ToolManager {
        ToolManager::new(overrides, bin_dir)
            .with_common_dirs(vec![])
            .without_path_lookup()
    }

    #[test]
    fn test_override_wins() {
        let dir = tempfile::tempdir().unwrap();
        let custom = dir.path().join("my-yt-dlp");
        fs::write(&custom, b"").unwrap();
        let bin = dir.path().join("bin");
        fs::create_dir(&bin).unwrap();
        fs::write(bin.join(ToolType::YtDlp.binary_name()), b"").unwrap();

        let manager = isolated(
            ToolPaths {
                yt_dlp: Some(custom.clone()),
                ..Default::default()
            },
            Some(bin),
        );
        assert_eq!(manager.locate(ToolType::YtDlp), Some(custom));
    }

    #[test]
    fn test_missing_override_falls_back_to_bin_dir() {
        let dir = tempfile::tempdir().unwrap();
        let ffmpeg = dir.path().join(ToolType::Ffmpeg.binary_name());
        fs::write(&ffmpeg, b"").unwrap();

        let manager = isolated(
            ToolPaths {
                ffmpeg: Some(dir.path().join("nope")),
                ..Default::default()
            },
            Some(dir.path().to_path_buf()),
        );
        assert_eq!(manager.locate(ToolType::Ffmpeg), Some(ffmpeg));
    }

    #[test]
    fn test_resolve_requires_ytdlp() {
        let manager = isolated(ToolPaths::default(), None);
        let err = manager.resolve().unwrap_err();
        assert!(matches!(err, DownloadError::ToolNotFound { ref tool, .. } if tool == "yt-dlp"));
    }

    #[test]
    fn test_resolve_without_ffprobe() {
        let dir = tempfile::tempdir().unwrap();
        for tool in [ToolType::YtDlp, ToolType::Ffmpeg] {
            fs::write(dir.path().join(tool.binary_name()), b"").unwrap();
        }
        let manager = isolated(ToolPaths::default(), None).with_common_dirs(vec![dir.path().to_path_buf()]);
        let tools = manager.resolve().unwrap();
        assert_eq!(tools.yt_dlp, dir.path().join(ToolType::YtDlp.binary_name()));
        assert!(tools.ffprobe.is_none());
    }

    #[test]
    fn test_tool_info_unavailable() {
        let manager = isolated(ToolPaths::default(), None);
        let info = manager.get_tool_info(ToolType::Ffprobe);
        assert!(!info.is_available);
        assert!(info.version.is_none());
        assert_eq!(info.name, "ffprobe");
    }
}
