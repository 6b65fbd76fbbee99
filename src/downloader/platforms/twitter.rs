use async_trait::async_trait;

use super::{PlanContext, PlatformPlan};
use crate::downloader::command::YtDlpCommand;
use crate::downloader::errors::Result;
use crate::downloader::format_selector::FormatSelector;
use crate::downloader::models::Platform;
use crate::downloader::stages::{Stage, StageKind};

const OUTPUT_TEMPLATE: &str = "%(uploader)s_%(upload_date)s_%(id)s.%(ext)s";

/// Direct -> WithCookies (NSFW and protected posts need a session)
pub struct TwitterPlan;

#[async_trait]
impl PlatformPlan for TwitterPlan {
    fn platform(&self) -> Platform {
        Platform::Twitter
    }

    async fn stages(&self, ctx: &PlanContext<'_>) -> Result<Vec<Stage>> {
        let direct = YtDlpCommand::new()
            .ffmpeg_location(Some(ctx.tools.ffmpeg.as_path()))
            .output(ctx.output_dir, OUTPUT_TEMPLATE)
            .format(FormatSelector::get_format_spec(Platform::Twitter, ctx.quality))
            .merge_output_format("mp4")
            .no_check_certificates()
            .add_metadata()
            .write_thumbnail()
            .network(ctx.network);

        let with_cookies = direct
            .clone()
            .cookies_from_browser(&ctx.network.cookies_browser);

        Ok(vec![
            Stage::ytdlp(StageKind::Direct, direct.build(ctx.url)),
            Stage::ytdlp(StageKind::WithCookies, with_cookies.build(ctx.url)),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{ctx, tools};
    use super::*;
    use std::path::Path;

    #[tokio::test]
    async fn test_direct_then_cookies() {
        let tools = tools();
        let network = crate::downloader::models::NetworkConfig::default();
        let url = "https://x.com/someone/status/1790000000000000000";
        let stages = TwitterPlan
            .stages(&ctx(url, Path::new("/tmp/tw"), &tools, &network))
            .await
            .unwrap();

        let kinds: Vec<StageKind> = stages.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, vec![StageKind::Direct, StageKind::WithCookies]);
        for flag in ["--add-metadata", "--write-thumbnail", "--no-check-certificates"] {
            assert!(stages[0].ytdlp_args().contains(&flag.to_string()), "{}", flag);
        }
    }
}
