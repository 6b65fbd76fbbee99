//! CLI entry point for social-downloader.

use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info};

use social_downloader_lib::config::AppConfig;
use social_downloader_lib::downloader::diagnostics::diagnose_error;
use social_downloader_lib::downloader::tools::ToolInfo;
use social_downloader_lib::downloader::validation::resolve_platform;
use social_downloader_lib::downloader::{
    DownloadProgress, DownloadRequest, DownloadResult, Downloader, DownloaderSettings, Platform,
};
use social_downloader_lib::logging::{init_tracing, LogOptions};

mod cli;
mod interactive;

use cli::{Args, Command, DownloadArgs};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    let config = AppConfig::load(args.config.as_deref()).context("failed to load configuration")?;

    let log_dir = if args.no_log_file {
        None
    } else {
        Some(args.log_dir.clone().unwrap_or_else(|| config.log_dir()))
    };
    let _guard = init_tracing(&LogOptions {
        verbose: args.verbose,
        quiet: args.quiet,
        log_dir,
    });

    debug!(?args, "CLI arguments parsed");

    match args.command {
        Command::Download(download) => run_download(&config, download, args.quiet).await,
        Command::Interactive { platform } => run_interactive(&config, platform, args.quiet).await,
        Command::Tools { save } => {
            let located = print_tools(&config);
            if save {
                save_tools(config, &located, args.config.as_deref())?;
            }
            Ok(())
        }
    }
}

async fn run_download(config: &AppConfig, args: DownloadArgs, quiet: bool) -> Result<()> {
    let platform = resolve_platform(args.url.trim(), args.platform)?;

    let mut settings = config.downloader_settings();
    settings.allow_fallback = !args.no_fallback;
    if let Some(browser) = args.cookies_browser {
        settings.network.cookies_browser = browser;
    }
    if args.proxy.is_some() {
        settings.network.proxy = args.proxy;
    }
    if args.timeout.is_some() {
        settings.process_timeout_secs = args.timeout;
    }

    let downloader = build_downloader(config, settings)?;
    let directory = args.output.unwrap_or_else(|| config.platform_dir(platform));
    let request = DownloadRequest::new(args.url, args.quality, directory).with_platform(Some(platform));

    let proxy_configured = downloader.settings().network.proxy.is_some();
    let result = execute(&downloader, request, quiet).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&result, proxy_configured);
    }

    if !result.success {
        bail!(
            "{}",
            result
                .error_message
                .as_deref()
                .unwrap_or("download failed")
        );
    }
    Ok(())
}

async fn run_interactive(config: &AppConfig, platform: Option<Platform>, quiet: bool) -> Result<()> {
    let downloader = build_downloader(config, config.downloader_settings())?;
    let proxy_configured = config.proxy.is_some();

    let title = platform.map(|p| p.display_name()).unwrap_or("Social Video");
    println!("=== {} Downloader ===", title);

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut stdout = io::stdout();

    let mut completed = 0usize;
    let mut failed = 0usize;

    while let Some(request) = interactive::prompt_request(&mut input, &mut stdout, platform, config)? {
        let result = execute(&downloader, request, quiet).await?;
        print_result(&result, proxy_configured);
        if result.success {
            completed += 1;
        } else {
            failed += 1;
        }
    }

    info!(completed, failed, "interactive session finished");
    println!("Goodbye!");
    Ok(())
}

fn build_downloader(config: &AppConfig, settings: DownloaderSettings) -> Result<Arc<Downloader>> {
    let tools = config.tool_manager().resolve()?;
    Ok(Arc::new(Downloader::new(tools, settings)))
}

/// Run on a background worker and render its progress until it finishes
async fn execute(downloader: &Arc<Downloader>, request: DownloadRequest, quiet: bool) -> Result<DownloadResult> {
    let (handle, progress) = downloader.spawn(request);
    let printer = tokio::spawn(render_progress(progress, quiet));

    let result = handle.await.context("download worker panicked")?;
    // channel closes when the worker drops its sender
    let _ = printer.await;
    Ok(result)
}

async fn render_progress(mut rx: UnboundedReceiver<DownloadProgress>, quiet: bool) {
    let mut last_len = 0usize;
    while let Some(progress) = rx.recv().await {
        if quiet {
            continue;
        }
        let line = format!("[{:>5.1}%] {}", progress.percent, progress.status);
        let pad = last_len.saturating_sub(line.chars().count());
        eprint!("\r{}{}", line, " ".repeat(pad));
        let _ = io::stderr().flush();
        last_len = line.chars().count();
    }
    if !quiet && last_len > 0 {
        eprintln!();
    }
}

fn print_result(result: &DownloadResult, proxy_configured: bool) {
    if result.success {
        println!("\nDownload completed successfully!");
        if let Some(path) = &result.output_file_path {
            println!("File: {}", path.display());
        }
        if let Some(size) = result.file_size_bytes {
            println!("Size: {:.2} MB", size as f64 / (1024.0 * 1024.0));
        }
        if let Some(dims) = &result.dimensions {
            println!("Resolution: {}", dims);
        }
        if let Some(stage) = result.stage {
            println!("Strategy: {}", stage);
        }
        if result.best_effort {
            println!("Note: watermark removal is best-effort; the video may still carry a watermark or be cropped.");
        }
        if let Some(meta) = &result.metadata {
            if let Some(uploader) = &meta.uploader {
                println!("Uploader: {}", uploader);
            }
            if let Some(caption) = meta.caption_preview(100) {
                println!("Caption: {}", caption);
            }
        }
    } else {
        let message = result.error_message.as_deref().unwrap_or("unknown error");
        eprintln!("\nDownload failed: {}", message);
        if let Some(reason) = diagnose_error(message) {
            eprintln!("Reason: {}", reason.description());
            eprintln!("Suggestion: {}", reason.suggestion());
            for hint in reason.retry_hints(proxy_configured) {
                eprintln!("  retry with {}", hint);
            }
        }
    }
}

fn print_tools(config: &AppConfig) -> Vec<ToolInfo> {
    let tools = config.tool_manager().get_all_tools();
    for tool in &tools {
        match (&tool.path, &tool.version) {
            (Some(path), Some(version)) => println!("{:<8} {} ({})", tool.name, path.display(), version),
            (Some(path), None) => println!("{:<8} {} (version unknown)", tool.name, path.display()),
            _ => println!("{:<8} not found (set {})", tool.name, tool.tool_type.env_var()),
        }
    }
    tools
}

fn save_tools(mut config: AppConfig, located: &[ToolInfo], explicit: Option<&Path>) -> Result<()> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => AppConfig::default_path().context("no configuration directory on this system")?,
    };
    let changed = config.remember_tools(located);
    config.save(&path)?;
    info!(path = %path.display(), changed, "tool paths saved");
    println!("Saved tool paths to {}", path.display());
    Ok(())
}
