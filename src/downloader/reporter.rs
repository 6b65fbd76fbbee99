// Locating what yt-dlp wrote and reading its sidecar metadata

use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use super::errors::Result;
use super::models::SidecarMetadata;

/// Window for the downloaded media file
pub const RECENT_WINDOW: Duration = Duration::from_secs(30);
/// Window for the `.info.json` sidecar
pub const SIDECAR_WINDOW: Duration = Duration::from_secs(10);

/// Newest file in `dir` ending in one of `extensions` that was modified at
/// most `window` before `now`. Partial downloads and crop temp files are
/// ignored.
pub fn find_recent_output(
    dir: &Path,
    extensions: &[&str],
    window: Duration,
    now: SystemTime,
) -> Option<PathBuf> {
    let entries = fs::read_dir(dir).ok()?;
    let mut best: Option<(SystemTime, PathBuf)> = None;

    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name = match path.file_name() {
            Some(n) => n.to_string_lossy().to_lowercase(),
            None => continue,
        };
        if name.ends_with(".part") || name.starts_with("temp_watermarked_") {
            continue;
        }
        if !extensions
            .iter()
            .any(|ext| name.ends_with(&format!(".{}", ext.to_lowercase())))
        {
            continue;
        }

        let modified = match entry.metadata().and_then(|m| m.modified()) {
            Ok(m) => m,
            Err(_) => continue,
        };
        // clock skew: a timestamp in the future counts as "just now"
        let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
        if age > window {
            continue;
        }

        if best.as_ref().map_or(true, |(t, _)| modified > *t) {
            best = Some((modified, path));
        }
    }

    best.map(|(_, p)| p)
}

/// Output path announced by yt-dlp on stdout. A merge line wins over
/// per-format destination lines.
pub fn parse_destination(stdout: &str) -> Option<PathBuf> {
    lazy_static::lazy_static! {
        static ref MERGER_RE: Regex = Regex::new(r#"\[Merger\]\s+Merging formats into\s+"(.+)""#).unwrap();
        static ref DEST_RE: Regex = Regex::new(r"\[download\]\s+Destination:\s+(.+)").unwrap();
        static ref ALREADY_RE: Regex = Regex::new(r"\[download\]\s+(.+?)\s+has already been downloaded").unwrap();
    }

    let mut merged = None;
    let mut destination = None;

    for line in stdout.lines() {
        let line = line.trim();
        if let Some(caps) = MERGER_RE.captures(line) {
            merged = Some(caps[1].trim().to_string());
        } else if let Some(caps) = DEST_RE.captures(line) {
            destination = Some(caps[1].trim().to_string());
        } else if let Some(caps) = ALREADY_RE.captures(line) {
            destination = Some(caps[1].trim().to_string());
        }
    }

    merged.or(destination).map(PathBuf::from)
}

/// Parse the newest recent `*.info.json` in `dir` and delete it.
pub fn take_sidecar(dir: &Path, window: Duration, now: SystemTime) -> Result<Option<SidecarMetadata>> {
    let path = match find_recent_output(dir, &["info.json"], window, now) {
        Some(p) => p,
        None => return Ok(None),
    };
    let content = fs::read_to_string(&path);
    if let Err(e) = fs::remove_file(&path) {
        tracing::warn!(path = %path.display(), error = %e, "could not delete metadata file");
    }

    let metadata: SidecarMetadata = serde_json::from_str(&content?)?;
    tracing::debug!(path = %path.display(), "metadata file consumed");
    Ok(Some(metadata))
}
