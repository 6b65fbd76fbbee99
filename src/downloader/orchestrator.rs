// Orchestrator - validation, platform plan, fallback sequence, report

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::diagnostics::diagnose_error;
use super::models::{DownloadProgress, DownloadRequest, DownloadResult, NetworkConfig, StageAttempt};
use super::platforms::{plan_for, PlanContext, PlatformPlan, ReportPolicy};
use super::postprocess;
use super::reporter::{self, RECENT_WINDOW, SIDECAR_WINDOW};
use super::sequencer::{FallbackSequencer, StageSuccess};
use super::tools::ResolvedTools;
use super::traits::{ProcessRunner, ProgressEmitter};
use super::utils::SystemRunner;
use super::validation;

#[derive(Debug, Clone)]
pub struct DownloaderSettings {
    pub network: NetworkConfig,
    /// false runs only the first stage of each plan
    pub allow_fallback: bool,
    /// Per-process timeout; None waits forever
    pub process_timeout_secs: Option<u64>,
    pub recent_window: Duration,
    pub sidecar_window: Duration,
}

impl Default for DownloaderSettings {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            allow_fallback: true,
            process_timeout_secs: None,
            recent_window: RECENT_WINDOW,
            sidecar_window: SIDECAR_WINDOW,
        }
    }
}

pub struct Downloader {
    runner: Arc<dyn ProcessRunner>,
    tools: ResolvedTools,
    settings: DownloaderSettings,
    http: reqwest::Client,
}

impl Downloader {
    pub fn new(tools: ResolvedTools, settings: DownloaderSettings) -> Self {
        let runner = Arc::new(SystemRunner::new(settings.process_timeout_secs));
        Self::with_runner(runner, tools, settings)
    }

    pub fn with_runner(
        runner: Arc<dyn ProcessRunner>,
        tools: ResolvedTools,
        settings: DownloaderSettings,
    ) -> Self {
        let http = build_http_client(&settings.network);
        Self {
            runner,
            tools,
            settings,
            http,
        }
    }

    pub fn tools(&self) -> &ResolvedTools {
        &self.tools
    }

    pub fn settings(&self) -> &DownloaderSettings {
        &self.settings
    }

    /// Download one URL, detecting the platform when the request has none
    pub async fn download(&self, request: &DownloadRequest, progress: &ProgressEmitter) -> DownloadResult {
        let platform = match validation::resolve_platform(&request.url, request.platform) {
            Ok(p) => p,
            Err(e) => {
                tracing::error!(url = %request.url, error = %e, "rejected URL");
                return DownloadResult::failure(e.to_string(), Vec::new());
            }
        };

        let plan = plan_for(platform, &self.http);
        self.download_with_plan(request, plan.as_ref(), progress).await
    }

    /// Run `plan` for the request. The URL is still validated against the
    /// plan's platform before any process starts.
    pub async fn download_with_plan(
        &self,
        request: &DownloadRequest,
        plan: &dyn PlatformPlan,
        progress: &ProgressEmitter,
    ) -> DownloadResult {
        let platform = plan.platform();
        if let Err(e) = validation::resolve_platform(&request.url, Some(platform)) {
            tracing::error!(url = %request.url, error = %e, "rejected URL");
            return DownloadResult::failure(e.to_string(), Vec::new());
        }

        let dir = request.output_directory.as_path();
        if let Err(e) = tokio::fs::create_dir_all(dir).await {
            tracing::error!(dir = %dir.display(), error = %e, "cannot create output directory");
            return DownloadResult::failure(
                format!("Cannot create output directory {}: {}", dir.display(), e),
                Vec::new(),
            );
        }

        tracing::info!(
            platform = %platform,
            url = %request.url,
            quality = %request.quality,
            dir = %dir.display(),
            "starting download"
        );
        progress.status(0.0, format!("Preparing {} download...", platform));

        let ctx = PlanContext {
            url: &request.url,
            quality: request.quality,
            output_dir: dir,
            tools: &self.tools,
            network: &self.settings.network,
        };
        let mut stages = match plan.stages(&ctx).await {
            Ok(stages) => stages,
            Err(e) => return DownloadResult::failure(e.to_string(), Vec::new()),
        };
        if !self.settings.allow_fallback {
            stages.truncate(1);
        }

        let started = Instant::now();
        let report = FallbackSequencer::new(self.runner.as_ref(), &self.tools, progress)
            .run(&stages)
            .await;

        match report.outcome {
            Ok(success) => {
                self.describe(success, report.attempts, plan.report_policy(), dir, started, progress)
                    .await
            }
            Err(e) => {
                let message = e.to_string();
                if let Some(reason) = diagnose_error(&e.stage_error_text()) {
                    tracing::error!(
                        platform = %platform,
                        reason = reason.description(),
                        suggestion = reason.suggestion(),
                        "download failed"
                    );
                }
                progress.status(0.0, "Download failed");
                DownloadResult::failure(message, report.attempts)
            }
        }
    }

    /// Run the download on a background task, reporting progress over a channel
    pub fn spawn(
        self: &Arc<Self>,
        request: DownloadRequest,
    ) -> (JoinHandle<DownloadResult>, mpsc::UnboundedReceiver<DownloadProgress>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let downloader = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let emitter = ProgressEmitter::new(tx);
            downloader.download(&request, &emitter).await
        });
        (handle, rx)
    }

    async fn describe(
        &self,
        success: StageSuccess,
        attempts: Vec<StageAttempt>,
        policy: ReportPolicy,
        dir: &Path,
        started: Instant,
        progress: &ProgressEmitter,
    ) -> DownloadResult {
        let now = SystemTime::now();
        // files written early in a long download are older than the bare window
        let elapsed = started.elapsed();

        let output_file = success
            .produced_file
            .clone()
            .or_else(|| reporter::parse_destination(&success.output.stdout).filter(|p| p.is_file()))
            .or_else(|| {
                reporter::find_recent_output(
                    dir,
                    policy.extensions,
                    self.settings.recent_window + elapsed,
                    now,
                )
            });

        if output_file.is_none() {
            tracing::warn!(dir = %dir.display(), "download finished but the output file was not found");
        }

        let metadata = if policy.read_sidecar {
            match reporter::take_sidecar(dir, self.settings.sidecar_window + elapsed, now) {
                Ok(meta) => meta,
                Err(e) => {
                    tracing::warn!(error = %e, "could not read metadata file");
                    None
                }
            }
        } else {
            None
        };

        if let Some(meta) = &metadata {
            let caption = meta.caption_preview(100).unwrap_or_default();
            tracing::info!(
                uploader = meta.uploader.as_deref().unwrap_or("-"),
                upload_date = meta.upload_date.as_deref().unwrap_or("-"),
                likes = ?meta.like_count,
                comments = ?meta.comment_count,
                caption = %caption,
                "post metadata"
            );
        }

        let dimensions = match (&self.tools.ffprobe, &output_file) {
            (Some(ffprobe), Some(file)) if policy.probe_dimensions => {
                postprocess::probe_dimensions(self.runner.as_ref(), ffprobe, file).await
            }
            _ => None,
        };

        let file_size_bytes = match &output_file {
            Some(file) => tokio::fs::metadata(file).await.ok().map(|m| m.len()),
            None => None,
        };

        tracing::info!(
            stage = %success.kind,
            best_effort = success.best_effort,
            file = ?output_file,
            size = ?file_size_bytes,
            dimensions = ?dimensions,
            "download complete"
        );
        progress.status(100.0, "Download complete");

        DownloadResult {
            success: true,
            output_file_path: output_file,
            error_message: None,
            stage: Some(success.kind),
            best_effort: success.best_effort,
            file_size_bytes,
            dimensions,
            metadata,
            attempts,
        }
    }
}

fn build_http_client(network: &NetworkConfig) -> reqwest::Client {
    let mut builder = reqwest::Client::builder();
    if let Some(proxy_url) = &network.proxy {
        match reqwest::Proxy::all(proxy_url) {
            Ok(proxy) => builder = builder.proxy(proxy),
            Err(e) => tracing::warn!(proxy = %proxy_url, error = %e, "ignoring invalid proxy for HTTP client"),
        }
    }
    builder.build().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "falling back to default HTTP client");
        reqwest::Client::new()
    })
}
