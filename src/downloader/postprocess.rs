// ffmpeg / ffprobe post-processing

use std::path::Path;

use super::errors::{DownloadError, Result};
use super::traits::{ProcessRunner, ProgressEmitter};

/// Keeps the top-left 90% of the frame, where TikTok's corner watermark is not
pub const CROP_FILTER: &str = "crop=in_w*0.9:in_h*0.9:0:0";

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Crop the watermark out of `input` into `output`.
///
/// Returns `Ok(true)` when ffmpeg produced the cropped file and `Ok(false)`
/// when the crop failed and the unmodified download was moved to `output`
/// instead. `input` never survives this call.
pub async fn crop_watermark(
    runner: &dyn ProcessRunner,
    ffmpeg: &Path,
    input: &Path,
    output: &Path,
    progress: &ProgressEmitter,
) -> Result<bool> {
    if !input.is_file() {
        return Err(DownloadError::PostProcess(format!(
            "downloaded file {} is missing",
            input.display()
        )));
    }

    progress.status(99.0, "Removing watermark...");
    let args = vec![
        "-i".to_string(),
        path_arg(input),
        "-vf".to_string(),
        CROP_FILTER.to_string(),
        "-c:a".to_string(),
        "copy".to_string(),
        "-y".to_string(),
        path_arg(output),
    ];

    let cropped = match runner.run(ffmpeg, &args, progress).await {
        Ok(out) if out.success() && output.is_file() => true,
        Ok(out) => {
            tracing::warn!(
                code = ?out.code,
                stderr = %out.stderr.lines().last().unwrap_or(""),
                "ffmpeg crop failed, keeping the watermarked file"
            );
            false
        }
        Err(e) if e.is_fatal() => {
            remove_quietly(input).await;
            return Err(e);
        }
        Err(e) => {
            tracing::warn!(error = %e, "ffmpeg crop failed, keeping the watermarked file");
            false
        }
    };

    if cropped {
        remove_quietly(input).await;
        return Ok(true);
    }

    let moved = move_file(input, output).await;
    remove_quietly(input).await;
    moved.map_err(|e| {
        DownloadError::PostProcess(format!(
            "could not move {} to {}: {}",
            input.display(),
            output.display(),
            e
        ))
    })?;
    Ok(false)
}

async fn move_file(from: &Path, to: &Path) -> std::io::Result<()> {
    if tokio::fs::rename(from, to).await.is_ok() {
        return Ok(());
    }
    // rename fails across filesystems
    tokio::fs::copy(from, to).await.map(|_| ())
}

async fn remove_quietly(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::debug!(path = %path.display(), error = %e, "could not remove temp file");
        }
    }
}

/// `WIDTHxHEIGHT` of the first video stream, None when ffprobe fails
pub async fn probe_dimensions(
    runner: &dyn ProcessRunner,
    ffprobe: &Path,
    file: &Path,
) -> Option<String> {
    let args = vec![
        "-v".to_string(),
        "error".to_string(),
        "-select_streams".to_string(),
        "v:0".to_string(),
        "-show_entries".to_string(),
        "stream=width,height".to_string(),
        "-of".to_string(),
        "csv=s=x:p=0".to_string(),
        path_arg(file),
    ];

    match runner.run(ffprobe, &args, &ProgressEmitter::disabled()).await {
        Ok(out) if out.success() => parse_dimensions(&out.stdout),
        Ok(out) => {
            tracing::debug!(code = ?out.code, "ffprobe failed");
            None
        }
        Err(e) => {
            tracing::debug!(error = %e, "ffprobe failed");
            None
        }
    }
}

fn parse_dimensions(stdout: &str) -> Option<String> {
    let line = stdout.lines().map(str::trim).find(|l| !l.is_empty())?;
    // some containers print a trailing separator ("1080x1920x")
    let line = line.trim_end_matches('x');
    let (w, h) = line.split_once('x')?;
    let w: u32 = w.parse().ok()?;
    let h: u32 = h.parse().ok()?;
    Some(format!("{}x{}", w, h))
}
