use async_trait::async_trait;

use super::{PlanContext, PlatformPlan, ReportPolicy};
use crate::downloader::command::YtDlpCommand;
use crate::downloader::errors::Result;
use crate::downloader::format_selector::FormatSelector;
use crate::downloader::models::Platform;
use crate::downloader::stages::{Stage, StageKind};

const OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";

/// Direct -> WithCookies -> BasicFormat
pub struct YouTubePlan;

#[async_trait]
impl PlatformPlan for YouTubePlan {
    fn platform(&self) -> Platform {
        Platform::YouTube
    }

    async fn stages(&self, ctx: &PlanContext<'_>) -> Result<Vec<Stage>> {
        let base = YtDlpCommand::new()
            .ffmpeg_location(Some(ctx.tools.ffmpeg.as_path()))
            .output(ctx.output_dir, OUTPUT_TEMPLATE)
            .merge_output_format("mp4")
            .add_metadata()
            .network(ctx.network);

        let direct = base
            .clone()
            .format(FormatSelector::get_format_spec(Platform::YouTube, ctx.quality));
        let with_cookies = direct
            .clone()
            .cookies_from_browser(&ctx.network.cookies_browser);
        let basic = base
            .format(FormatSelector::basic_format(Platform::YouTube))
            .no_check_certificates();

        Ok(vec![
            Stage::ytdlp(StageKind::Direct, direct.build(ctx.url)),
            Stage::ytdlp(StageKind::WithCookies, with_cookies.build(ctx.url)),
            Stage::ytdlp(StageKind::BasicFormat, basic.build(ctx.url)),
        ])
    }

    fn report_policy(&self) -> ReportPolicy {
        ReportPolicy {
            probe_dimensions: true,
            ..ReportPolicy::default()
        }
    }
}
