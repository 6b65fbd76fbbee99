use async_trait::async_trait;

use super::{PlanContext, PlatformPlan};
use crate::downloader::command::YtDlpCommand;
use crate::downloader::errors::Result;
use crate::downloader::format_selector::FormatSelector;
use crate::downloader::models::Platform;
use crate::downloader::stages::{Stage, StageKind};
use crate::downloader::validation;

const OUTPUT_TEMPLATE: &str = "facebook_video_%(upload_date)s_%(id)s.%(ext)s";
const BASIC_TEMPLATE: &str = "facebook_video_%(id)s.mp4";

/// Direct -> WithCookies -> MobileUrl -> BasicFormat
pub struct FacebookPlan;

#[async_trait]
impl PlatformPlan for FacebookPlan {
    fn platform(&self) -> Platform {
        Platform::Facebook
    }

    async fn stages(&self, ctx: &PlanContext<'_>) -> Result<Vec<Stage>> {
        let base = YtDlpCommand::new()
            .ffmpeg_location(Some(ctx.tools.ffmpeg.as_path()))
            .merge_output_format("mp4")
            .network(ctx.network);

        let direct = base
            .clone()
            .output(ctx.output_dir, OUTPUT_TEMPLATE)
            .format(FormatSelector::get_format_spec(Platform::Facebook, ctx.quality))
            .geo_bypass();

        let mobile = validation::mobile_url(Platform::Facebook, ctx.url);

        let mut stages = vec![
            Stage::ytdlp(StageKind::Direct, direct.build(ctx.url)),
            Stage::ytdlp(
                StageKind::WithCookies,
                direct
                    .clone()
                    .cookies_from_browser(&ctx.network.cookies_browser)
                    .build(ctx.url),
            ),
        ];

        // fb.watch links and m.facebook.com URLs have no separate mobile form
        match &mobile {
            Some(mobile_url) => {
                stages.push(Stage::ytdlp(StageKind::MobileUrl, direct.build(mobile_url)));
            }
            None => {
                tracing::debug!(url = ctx.url, "no mobile URL variant, skipping mobile stage");
            }
        }

        let basic = base
            .output(ctx.output_dir, BASIC_TEMPLATE)
            .format(FormatSelector::basic_format(Platform::Facebook))
            .no_check_certificates();
        stages.push(Stage::ytdlp(
            StageKind::BasicFormat,
            basic.build(mobile.as_deref().unwrap_or(ctx.url)),
        ));

        Ok(stages)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{ctx, tools};
    use super::*;
    use crate::downloader::command::arg_value;
    use crate::downloader::models::NetworkConfig;
    use std::path::Path;

    #[tokio::test]
    async fn test_four_stages_in_order() {
        let tools = tools();
        let network = NetworkConfig {
            cookies_browser: "firefox".to_string(),
            ..Default::default()
        };
        let url = "https://www.facebook.com/somepage/videos/1234567890";
        let stages = FacebookPlan
            .stages(&ctx(url, Path::new("/tmp/fb"), &tools, &network))
            .await
            .unwrap();

        let kinds: Vec<StageKind> = stages.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                StageKind::Direct,
                StageKind::WithCookies,
                StageKind::MobileUrl,
                StageKind::BasicFormat
            ]
        );

        assert!(stages[0].ytdlp_args().contains(&"--geo-bypass".to_string()));
        assert_eq!(arg_value(stages[1].ytdlp_args(), "--cookies-from-browser"), Some("firefox"));
        assert_eq!(
            stages[2].target_url(),
            Some("https://m.facebook.com/somepage/videos/1234567890")
        );

        let basic = stages[3].ytdlp_args();
        assert_eq!(arg_value(basic, "-f"), Some("best"));
        assert!(basic.contains(&"--no-check-certificates".to_string()));
        assert!(arg_value(basic, "-o").unwrap().ends_with("facebook_video_%(id)s.mp4"));
        assert_eq!(
            stages[3].target_url(),
            Some("https://m.facebook.com/somepage/videos/1234567890")
        );
    }

    #[tokio::test]
    async fn test_fb_watch_skips_mobile_stage() {
        let tools = tools();
        let network = NetworkConfig::default();
        let url = "https://fb.watch/abcDEF123/";
        let stages = FacebookPlan
            .stages(&ctx(url, Path::new("/tmp/fb"), &tools, &network))
            .await
            .unwrap();

        assert!(stages.iter().all(|s| s.kind != StageKind::MobileUrl));
        assert_eq!(stages.last().and_then(|s| s.target_url()), Some(url));
    }
}
