// Fallback sequencer - runs a platform's stages in order
//
// Stage N+1 only runs after stage N failed. The first success wins; when
// every stage fails the last stage's error text is reported.

use std::path::PathBuf;

use super::errors::{DownloadError, Result};
use super::models::StageAttempt;
use super::postprocess;
use super::stages::{Stage, StageAction, StageKind};
use super::tools::ResolvedTools;
use super::traits::{ProcessOutput, ProcessRunner, ProgressEmitter};

/// The stage that produced the download
#[derive(Debug, Clone)]
pub struct StageSuccess {
    pub kind: StageKind,
    pub best_effort: bool,
    /// yt-dlp output of the successful stage
    pub output: ProcessOutput,
    /// Set when the stage itself knows the output path (watermark crop)
    pub produced_file: Option<PathBuf>,
}

#[derive(Debug)]
pub struct SequenceReport {
    pub attempts: Vec<StageAttempt>,
    pub outcome: Result<StageSuccess>,
}

pub struct FallbackSequencer<'a> {
    runner: &'a dyn ProcessRunner,
    tools: &'a ResolvedTools,
    progress: &'a ProgressEmitter,
}

impl<'a> FallbackSequencer<'a> {
    pub fn new(
        runner: &'a dyn ProcessRunner,
        tools: &'a ResolvedTools,
        progress: &'a ProgressEmitter,
    ) -> Self {
        Self {
            runner,
            tools,
            progress,
        }
    }

    pub async fn run(&self, stages: &[Stage]) -> SequenceReport {
        let total = stages.len();
        let mut attempts = Vec::with_capacity(total);
        let mut last_error: Option<DownloadError> = None;

        for (index, stage) in stages.iter().enumerate() {
            tracing::info!(
                stage = %stage.kind,
                attempt = index + 1,
                total,
                url = stage.target_url().unwrap_or(""),
                "trying download strategy"
            );
            self.progress.status(
                0.0,
                format!("Strategy {}/{}: {}", index + 1, total, stage.kind),
            );

            match self.run_stage(stage).await {
                Ok(success) => {
                    tracing::info!(stage = %stage.kind, best_effort = success.best_effort, "strategy succeeded");
                    attempts.push(StageAttempt {
                        stage: stage.kind,
                        success: true,
                        error: None,
                    });
                    return SequenceReport {
                        attempts,
                        outcome: Ok(success),
                    };
                }
                Err(e) => {
                    let text = e.stage_error_text();
                    attempts.push(StageAttempt {
                        stage: stage.kind,
                        success: false,
                        error: Some(text.clone()),
                    });

                    if e.is_fatal() {
                        tracing::error!(stage = %stage.kind, error = %e, "aborting download");
                        return SequenceReport {
                            attempts,
                            outcome: Err(e),
                        };
                    }

                    tracing::warn!(stage = %stage.kind, error = %text, "strategy failed");
                    last_error = Some(e);
                }
            }
        }

        let last_error = last_error
            .map(|e| e.stage_error_text())
            .unwrap_or_else(|| "no download strategies available".to_string());

        SequenceReport {
            attempts,
            outcome: Err(DownloadError::StrategiesExhausted {
                attempts: total,
                last_error,
            }),
        }
    }

    async fn run_stage(&self, stage: &Stage) -> Result<StageSuccess> {
        match &stage.action {
            StageAction::YtDlp { args } => {
                let output = self.run_ytdlp(stage.kind, args).await?;
                Ok(StageSuccess {
                    kind: stage.kind,
                    best_effort: stage.best_effort,
                    output,
                    produced_file: None,
                })
            }
            StageAction::WatermarkCrop {
                download_args,
                temp_file,
                output_file,
            } => {
                let output = self.run_ytdlp(stage.kind, download_args).await?;
                let cropped = postprocess::crop_watermark(
                    self.runner,
                    &self.tools.ffmpeg,
                    temp_file,
                    output_file,
                    self.progress,
                )
                .await?;
                tracing::info!(cropped, file = %output_file.display(), "watermark post-processing done");

                Ok(StageSuccess {
                    kind: stage.kind,
                    // either cropped or still watermarked
                    best_effort: true,
                    output,
                    produced_file: Some(output_file.clone()),
                })
            }
        }
    }

    async fn run_ytdlp(&self, kind: StageKind, args: &[String]) -> Result<ProcessOutput> {
        let output = self.runner.run(&self.tools.yt_dlp, args, self.progress).await?;
        if output.success() {
            Ok(output)
        } else {
            Err(DownloadError::StageFailed {
                stage: kind,
                code: output.code,
                stderr: output.stderr,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::testing::{FakeRunner, FakeStep};
    use std::path::Path;

    fn tools() -> ResolvedTools {
        ResolvedTools {
            yt_dlp: PathBuf::from("/bin/yt-dlp"),
            ffmpeg: PathBuf::from("/bin/ffmpeg"),
            ffprobe: None,
        }
    }

    fn stage(kind: StageKind, url: &str) -> Stage {
        Stage::ytdlp(kind, vec!["-f".to_string(), "best".to_string(), url.to_string()])
    }

    fn four_stages() -> Vec<Stage> {
        vec![
            stage(StageKind::Direct, "u1"),
            stage(StageKind::WithCookies, "u2"),
            stage(StageKind::MobileUrl, "u3").best_effort(),
            stage(StageKind::BasicFormat, "u4").best_effort(),
        ]
    }

    #[tokio::test]
    async fn test_stops_at_first_success() {
        let runner = FakeRunner::new(vec![
            FakeStep::fail(1, "ERROR: HTTP Error 403: Forbidden"),
            FakeStep::ok(),
        ]);
        let tools = tools();
        let progress = ProgressEmitter::disabled();
        let report = FallbackSequencer::new(&runner, &tools, &progress)
            .run(&four_stages())
            .await;

        let success = report.outcome.unwrap();
        assert_eq!(success.kind, StageKind::WithCookies);
        assert!(!success.best_effort);

        let urls: Vec<String> = runner
            .calls()
            .iter()
            .map(|c| c.args.last().cloned().unwrap())
            .collect();
        assert_eq!(urls, vec!["u1", "u2"]);
        assert_eq!(report.attempts.len(), 2);
        assert!(!report.attempts[0].success);
        assert!(report.attempts[1].success);
    }

    #[tokio::test]
    async fn test_exhaustion_reports_last_error() {
        let runner = FakeRunner::new(vec![
            FakeStep::fail(1, "ERROR: first"),
            FakeStep::error(DownloadError::Timeout {
                program: "yt-dlp".to_string(),
                seconds: 30,
            }),
            FakeStep::fail(1, "ERROR: third"),
            FakeStep::fail(2, "[tiktok] x: Downloading\nERROR: final failure"),
        ]);
        let tools = tools();
        let progress = ProgressEmitter::disabled();
        let report = FallbackSequencer::new(&runner, &tools, &progress)
            .run(&four_stages())
            .await;

        match report.outcome {
            Err(DownloadError::StrategiesExhausted { attempts, last_error }) => {
                assert_eq!(attempts, 4);
                assert_eq!(last_error, "ERROR: final failure");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        let kinds: Vec<StageKind> = report.attempts.iter().map(|a| a.stage).collect();
        assert_eq!(
            kinds,
            vec![
                StageKind::Direct,
                StageKind::WithCookies,
                StageKind::MobileUrl,
                StageKind::BasicFormat
            ]
        );
        assert_eq!(runner.calls().len(), 4);
    }

    #[tokio::test]
    async fn test_fatal_error_stops_sequence() {
        let runner = FakeRunner::new(vec![FakeStep::error(DownloadError::tool_not_found("yt-dlp"))]);
        let tools = tools();
        let progress = ProgressEmitter::disabled();
        let report = FallbackSequencer::new(&runner, &tools, &progress)
            .run(&four_stages())
            .await;

        assert!(matches!(report.outcome, Err(DownloadError::ToolNotFound { .. })));
        assert_eq!(runner.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_best_effort_flag_carried() {
        let runner = FakeRunner::new(vec![
            FakeStep::fail(1, "ERROR: a"),
            FakeStep::fail(1, "ERROR: b"),
            FakeStep::ok(),
        ]);
        let tools = tools();
        let progress = ProgressEmitter::disabled();
        let report = FallbackSequencer::new(&runner, &tools, &progress)
            .run(&four_stages())
            .await;
        let success = report.outcome.unwrap();
        assert_eq!(success.kind, StageKind::MobileUrl);
        assert!(success.best_effort);
    }

    #[tokio::test]
    async fn test_empty_plan_is_exhausted() {
        let runner = FakeRunner::new(vec![]);
        let tools = tools();
        let progress = ProgressEmitter::disabled();
        let report = FallbackSequencer::new(&runner, &tools, &progress).run(&[]).await;
        assert!(matches!(
            report.outcome,
            Err(DownloadError::StrategiesExhausted { attempts: 0, .. })
        ));
    }

    #[tokio::test]
    async fn test_watermark_crop_stage() {
        let dir = tempfile::tempdir().unwrap();
        let temp = dir.path().join("temp_watermarked_42.mp4");
        let out = dir.path().join("tiktok_nowm_42.mp4");

        let stages = vec![
            stage(StageKind::Direct, "u1"),
            Stage {
                kind: StageKind::WatermarkCrop,
                action: StageAction::WatermarkCrop {
                    download_args: vec!["u2".to_string()],
                    temp_file: temp.clone(),
                    output_file: out.clone(),
                },
                best_effort: true,
            },
        ];
        let runner = FakeRunner::new(vec![
            FakeStep::fail(1, "ERROR: nope"),
            FakeStep::ok().creating(&temp),
            FakeStep::ok().creating(&out),
        ]);
        let tools = tools();
        let progress = ProgressEmitter::disabled();
        let report = FallbackSequencer::new(&runner, &tools, &progress).run(&stages).await;

        let success = report.outcome.unwrap();
        assert_eq!(success.kind, StageKind::WatermarkCrop);
        assert!(success.best_effort);
        assert_eq!(success.produced_file.as_deref(), Some(out.as_path()));
        assert!(!temp.exists());

        let calls = runner.calls();
        assert_eq!(calls[1].program, Path::new("/bin/yt-dlp"));
        assert_eq!(calls[2].program, Path::new("/bin/ffmpeg"));
    }

    #[tokio::test]
    async fn test_crop_stage_without_download_moves_on() {
        let dir = tempfile::tempdir().unwrap();
        let stages = vec![
            Stage {
                kind: StageKind::WatermarkCrop,
                action: StageAction::WatermarkCrop {
                    download_args: vec!["u1".to_string()],
                    temp_file: dir.path().join("temp_watermarked_1.mp4"),
                    output_file: dir.path().join("tiktok_nowm_1.mp4"),
                },
                best_effort: true,
            },
            stage(StageKind::BasicFormat, "u2").best_effort(),
        ];
        // yt-dlp "succeeds" but writes nothing
        let runner = FakeRunner::new(vec![FakeStep::ok(), FakeStep::ok()]);
        let tools = tools();
        let progress = ProgressEmitter::disabled();
        let report = FallbackSequencer::new(&runner, &tools, &progress).run(&stages).await;

        assert_eq!(report.outcome.unwrap().kind, StageKind::BasicFormat);
        assert!(report.attempts[0].error.as_deref().unwrap().contains("missing"));
    }
}
