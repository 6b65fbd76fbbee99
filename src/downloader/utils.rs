// Process execution helpers shared by all stages

use async_trait::async_trait;
use regex::Regex;
use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command as TokioCommand;
use tokio::time::{timeout, Duration as TokioDuration};

use super::errors::DownloadError;
use super::traits::{ProcessOutput, ProcessRunner, ProgressEmitter};

/// Runs real processes through tokio
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    /// Kill the process after this many seconds (None = wait forever)
    pub timeout_secs: Option<u64>,
}

impl SystemRunner {
    pub fn new(timeout_secs: Option<u64>) -> Self {
        Self { timeout_secs }
    }
}

#[async_trait]
impl ProcessRunner for SystemRunner {
    async fn run(
        &self,
        program: &Path,
        args: &[String],
        progress: &ProgressEmitter,
    ) -> Result<ProcessOutput, DownloadError> {
        run_output_with_timeout(program, args, self.timeout_secs, progress).await
    }
}

fn program_name(program: &Path) -> String {
    program
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| program.to_string_lossy().into_owned())
}

/// Run command, streaming stdout lines into the progress parser
pub async fn run_output_with_timeout(
    program: &Path,
    args: &[String],
    timeout_secs: Option<u64>,
    progress: &ProgressEmitter,
) -> Result<ProcessOutput, DownloadError> {
    let name = program_name(program);
    tracing::debug!(program = %program.display(), args = %args.join(" "), "spawning process");

    let mut child = TokioCommand::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DownloadError::tool_not_found(&name)
            } else {
                DownloadError::ExecutionError(format!("Failed to start {}: {}", name, e))
            }
        })?;

    let stdout_pipe = child
        .stdout
        .take()
        .ok_or_else(|| DownloadError::ExecutionError(format!("Failed to capture stdout from {}", name)))?;
    let mut stderr_pipe = child
        .stderr
        .take()
        .ok_or_else(|| DownloadError::ExecutionError(format!("Failed to capture stderr from {}", name)))?;

    let emitter = progress.clone();
    let stdout_task = tokio::spawn(async move {
        // raw bytes: titles may arrive in a non-UTF-8 console code page
        let mut reader = BufReader::new(stdout_pipe);
        let mut raw = Vec::new();
        let mut collected = Vec::new();
        loop {
            raw.clear();
            match reader.read_until(b'\n', &mut raw).await {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(error = %e, "stdout read failed");
                    break;
                }
            }
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches(['\r', '\n']);
            if let Some((percent, status)) = parse_ytdlp_progress(line) {
                emitter.status(percent, status);
            }
            if line.contains("Destination") || line.contains("[Merger]") {
                tracing::debug!(target: "yt-dlp", "{}", line);
            }
            collected.push(line.to_string());
        }
        collected.join("\n")
    });
    let stderr_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        let _ = stderr_pipe.read_to_end(&mut buf).await;
        String::from_utf8_lossy(&buf).into_owned()
    });

    let status = match timeout_secs {
        Some(secs) => {
            let waited = timeout(TokioDuration::from_secs(secs), child.wait()).await;
            match waited {
                Ok(res) => res,
                Err(_) => {
                    let _ = child.kill().await;
                    stdout_task.abort();
                    stderr_task.abort();
                    return Err(DownloadError::Timeout {
                        program: name,
                        seconds: secs,
                    });
                }
            }
        }
        None => child.wait().await,
    }
    .map_err(|e| DownloadError::ExecutionError(format!("Failed to wait for {}: {}", name, e)))?;

    let stdout = stdout_task
        .await
        .map_err(|e| DownloadError::ExecutionError(format!("stdout task failed: {}", e)))?;
    let stderr = stderr_task
        .await
        .map_err(|e| DownloadError::ExecutionError(format!("stderr task failed: {}", e)))?;

    Ok(ProcessOutput {
        code: status.code(),
        stdout,
        stderr,
    })
}

/// Parse yt-dlp progress line like:
/// [download]   6.2% of ~ 343.72MiB at  420.30KiB/s ETA 12:32 (frag 29/454)
/// Returns (percent, status_string)
pub fn parse_ytdlp_progress(line: &str) -> Option<(f32, String)> {
    lazy_static::lazy_static! {
        static ref PROGRESS_RE: Regex = Regex::new(
            r"\[download\]\s+(\d+\.?\d*)%\s+of\s+~?\s*(\d+\.?\d*\s*\w+)(?:\s+at\s+(\S+/s))?(?:\s+ETA\s+(\S+))?(?:\s+\(frag\s+(\d+)/(\d+)\))?"
        ).unwrap();
        static ref DEST_RE: Regex = Regex::new(r"\[download\]\s+Destination:\s+(.+)").unwrap();
        static ref MERGE_RE: Regex = Regex::new(r"\[Merger?\]\s+Merging").unwrap();
        static ref ALREADY_RE: Regex = Regex::new(r"has already been downloaded").unwrap();
    }

    if let Some(caps) = PROGRESS_RE.captures(line) {
        let percent: f32 = caps.get(1)?.as_str().parse().ok()?;
        let size = caps.get(2).map(|m| m.as_str()).unwrap_or("?");
        let speed = caps.get(3).map(|m| m.as_str()).unwrap_or("?");
        let eta = caps.get(4).map(|m| m.as_str()).unwrap_or("");

        let status = match (caps.get(5), caps.get(6)) {
            (Some(fc), Some(ft)) => format!(
                "{:.1}% of {} @ {} ETA {} (frag {}/{})",
                percent,
                size,
                speed,
                eta,
                fc.as_str(),
                ft.as_str()
            ),
            _ if !eta.is_empty() => format!("{:.1}% of {} @ {} ETA {}", percent, size, speed, eta),
            _ => format!("{:.1}% of {} @ {}", percent, size, speed),
        };

        return Some((percent, status));
    }

    if let Some(caps) = DEST_RE.captures(line) {
        let filename = caps.get(1).map(|m| m.as_str()).unwrap_or("file");
        let short_name: String = Path::new(filename)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| filename.to_string())
            .chars()
            .take(50)
            .collect();
        return Some((0.0, format!("Starting: {}...", short_name)));
    }

    if MERGE_RE.is_match(line) {
        return Some((99.0, "Merging video and audio...".to_string()));
    }

    if ALREADY_RE.is_match(line) {
        return Some((100.0, "File already downloaded".to_string()));
    }

    None
}
