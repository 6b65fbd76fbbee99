use std::path::{Path, PathBuf};

use time::macros::format_description;
use time::OffsetDateTime;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    pub verbose: u8,
    pub quiet: bool,
    /// Also write a timestamped log file here
    pub log_dir: Option<PathBuf>,
}

/// Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
pub fn default_level(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        "error"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

/// `downloader_log_YYYYmmdd_HHMMSS.txt`
pub fn log_file_name(now: OffsetDateTime) -> String {
    let stamp = now
        .format(format_description!("[year][month][day]_[hour][minute][second]"))
        .unwrap_or_else(|_| now.unix_timestamp().to_string());
    format!("downloader_log_{}.txt", stamp)
}

fn local_now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

/// Install the global subscriber: stderr always, plus a log file when a
/// directory is given. Keep the returned guard alive until exit or buffered
/// file output is lost.
pub fn init_tracing(options: &LogOptions) -> Option<WorkerGuard> {
    let level = default_level(options.verbose, options.quiet);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    let (file_layer, guard) = match options.log_dir.as_deref().and_then(open_log_dir) {
        Some(dir) => {
            let file_appender = tracing_appender::rolling::never(&dir, log_file_name(local_now()));
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer().with_writer(non_blocking).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init();

    guard
}

fn open_log_dir(dir: &Path) -> Option<PathBuf> {
    match std::fs::create_dir_all(dir) {
        Ok(()) => Some(dir.to_path_buf()),
        Err(err) => {
            eprintln!("Failed to create log directory {}: {err}", dir.display());
            None
        }
    }
}
