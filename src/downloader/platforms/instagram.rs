use async_trait::async_trait;

use super::{PlanContext, PlatformPlan, ReportPolicy};
use crate::downloader::command::YtDlpCommand;
use crate::downloader::errors::Result;
use crate::downloader::format_selector::FormatSelector;
use crate::downloader::models::Platform;
use crate::downloader::stages::{Stage, StageKind};

const OUTPUT_TEMPLATE: &str = "%(uploader)s_%(upload_date)s_%(title).50s.%(ext)s";

/// Single direct stage; the post description comes from the info sidecar
pub struct InstagramPlan;

#[async_trait]
impl PlatformPlan for InstagramPlan {
    fn platform(&self) -> Platform {
        Platform::Instagram
    }

    async fn stages(&self, ctx: &PlanContext<'_>) -> Result<Vec<Stage>> {
        let direct = YtDlpCommand::new()
            .ffmpeg_location(Some(ctx.tools.ffmpeg.as_path()))
            .output(ctx.output_dir, OUTPUT_TEMPLATE)
            .format(FormatSelector::get_format_spec(Platform::Instagram, ctx.quality))
            .merge_output_format("mp4")
            .write_info_json(true)
            .network(ctx.network);

        Ok(vec![Stage::ytdlp(StageKind::Direct, direct.build(ctx.url))])
    }

    fn report_policy(&self) -> ReportPolicy {
        ReportPolicy {
            extensions: &["mp4", "webm", "mkv", "jpg", "jpeg", "png"],
            read_sidecar: true,
            probe_dimensions: false,
        }
    }
}
