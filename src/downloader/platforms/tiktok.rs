use async_trait::async_trait;
use std::time::Duration;

use super::{PlanContext, PlatformPlan};
use crate::downloader::command::{YtDlpCommand, DESKTOP_USER_AGENT, MOBILE_USER_AGENT};
use crate::downloader::errors::Result;
use crate::downloader::format_selector::FormatSelector;
use crate::downloader::models::Platform;
use crate::downloader::stages::{Stage, StageAction, StageKind};
use crate::downloader::validation;

const OUTPUT_TEMPLATE: &str = "tiktok_nowm_%(id)s.%(ext)s";
const REFERER_HEADER: &str = "Referer:https://www.tiktok.com/";
const RESOLVE_TIMEOUT: Duration = Duration::from_secs(10);

/// Direct (no watermark) -> WatermarkCrop -> MobileUrl -> BasicFormat
///
/// Everything after the first stage may leave the watermark in place or
/// crop part of the frame, so those results are flagged best-effort.
pub struct TikTokPlan {
    /// None disables short-link resolution
    http: Option<reqwest::Client>,
}

impl TikTokPlan {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http: Some(http) }
    }

    /// Plan that never touches the network
    pub fn offline() -> Self {
        Self { http: None }
    }

    /// Numeric video id, following the redirect of vm./t/ short links
    async fn resolve_video_id(&self, url: &str) -> Option<String> {
        if let Some(id) = validation::tiktok_video_id(url) {
            return Some(id);
        }
        if !validation::is_tiktok_short_link(url) {
            return None;
        }
        self.follow_short_link(url).await
    }

    /// HEAD the link and read the id from the URL the redirects end at
    async fn follow_short_link(&self, url: &str) -> Option<String> {
        let client = self.http.as_ref()?;
        let response = client
            .head(url)
            .header(reqwest::header::USER_AGENT, DESKTOP_USER_AGENT)
            .timeout(RESOLVE_TIMEOUT)
            .send()
            .await;

        match response {
            Ok(resp) => {
                let final_url = resp.url().as_str().to_string();
                tracing::debug!(short = url, resolved = %final_url, "short link resolved");
                validation::tiktok_video_id(&final_url)
            }
            Err(e) => {
                tracing::warn!(url, error = %e, "could not resolve TikTok short link");
                None
            }
        }
    }
}

#[async_trait]
impl PlatformPlan for TikTokPlan {
    fn platform(&self) -> Platform {
        Platform::TikTok
    }

    async fn stages(&self, ctx: &PlanContext<'_>) -> Result<Vec<Stage>> {
        let base = YtDlpCommand::new()
            .ffmpeg_location(Some(ctx.tools.ffmpeg.as_path()))
            .network(ctx.network);

        let direct = base
            .clone()
            .output(ctx.output_dir, OUTPUT_TEMPLATE)
            .format(FormatSelector::get_format_spec(Platform::TikTok, ctx.quality))
            .merge_output_format("mp4")
            .user_agent(DESKTOP_USER_AGENT)
            .header(REFERER_HEADER)
            .no_check_certificates();

        let mut stages = vec![Stage::ytdlp(StageKind::Direct, direct.build(ctx.url))];

        match self.resolve_video_id(ctx.url).await {
            Some(id) => {
                let temp_file = ctx.output_dir.join(format!("temp_watermarked_{}.mp4", id));
                let output_file = ctx.output_dir.join(format!("tiktok_nowm_{}.mp4", id));
                let download_args = base
                    .clone()
                    .output(ctx.output_dir, &format!("temp_watermarked_{}.mp4", id))
                    .format("best")
                    .user_agent(DESKTOP_USER_AGENT)
                    .header(REFERER_HEADER)
                    .build(ctx.url);

                stages.push(Stage {
                    kind: StageKind::WatermarkCrop,
                    action: StageAction::WatermarkCrop {
                        download_args,
                        temp_file,
                        output_file,
                    },
                    best_effort: true,
                });
            }
            None => {
                tracing::warn!(url = ctx.url, "could not extract TikTok video id, skipping watermark crop");
            }
        }

        match validation::mobile_url(Platform::TikTok, ctx.url) {
            Some(mobile_url) => {
                let mobile = base
                    .clone()
                    .output(ctx.output_dir, OUTPUT_TEMPLATE)
                    .format("best")
                    .user_agent(MOBILE_USER_AGENT)
                    .no_check_certificates();
                stages.push(Stage::ytdlp(StageKind::MobileUrl, mobile.build(&mobile_url)).best_effort());
            }
            None => {
                tracing::debug!(url = ctx.url, "no mobile URL variant, skipping mobile stage");
            }
        }

        let basic = base
            .output(ctx.output_dir, OUTPUT_TEMPLATE)
            .format(FormatSelector::basic_format(Platform::TikTok))
            .no_check_certificates();
        stages.push(Stage::ytdlp(StageKind::BasicFormat, basic.build(ctx.url)).best_effort());

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
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_full_plan_for_canonical_url() {
        let tools = tools();
        let network = NetworkConfig::default();
        let url = "https://www.tiktok.com/@someone/video/7234567890123456789";
        let dir = Path::new("/tmp/tt");
        let stages = TikTokPlan::offline()
            .stages(&ctx(url, dir, &tools, &network))
            .await
            .unwrap();

        let kinds: Vec<StageKind> = stages.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                StageKind::Direct,
                StageKind::WatermarkCrop,
                StageKind::MobileUrl,
                StageKind::BasicFormat
            ]
        );
        assert!(!stages[0].best_effort);
        assert!(stages[1..].iter().all(|s| s.best_effort));

        let direct = stages[0].ytdlp_args();
        assert_eq!(arg_value(direct, "--user-agent"), Some(DESKTOP_USER_AGENT));
        assert_eq!(arg_value(direct, "--add-header"), Some(REFERER_HEADER));

        match &stages[1].action {
            StageAction::WatermarkCrop {
                temp_file,
                output_file,
                ..
            } => {
                assert_eq!(temp_file, &dir.join("temp_watermarked_7234567890123456789.mp4"));
                assert_eq!(output_file, &dir.join("tiktok_nowm_7234567890123456789.mp4"));
            }
            other => panic!("expected crop stage, got {:?}", other),
        }

        assert_eq!(
            stages[2].target_url(),
            Some("https://m.tiktok.com/@someone/video/7234567890123456789")
        );
        assert_eq!(arg_value(stages[2].ytdlp_args(), "--user-agent"), Some(MOBILE_USER_AGENT));
        assert_eq!(arg_value(stages[3].ytdlp_args(), "-f"), Some("b"));
    }

    /// Answers the first request with a redirect to `target`, later ones with 200
    async fn serve_redirect(listener: TcpListener, target: String) {
        let mut redirected = false;
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let mut buf = vec![0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let response = if redirected {
                "HTTP/1.1 200 OK\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_string()
            } else {
                redirected = true;
                format!(
                    "HTTP/1.1 302 Found\r\nLocation: {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                    target
                )
            };
            let _ = socket.write_all(response.as_bytes()).await;
        }
    }

    fn local_client() -> reqwest::Client {
        reqwest::Client::builder().no_proxy().build().unwrap()
    }

    #[tokio::test]
    async fn test_short_link_redirect_yields_video_id() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let target = format!("http://{}/www.tiktok.com/@someone/video/7234567890123456789", addr);
        let server = tokio::spawn(serve_redirect(listener, target));

        let id = TikTokPlan::new(local_client())
            .follow_short_link(&format!("http://{}/ZMabc123/", addr))
            .await;
        server.abort();

        assert_eq!(id.as_deref(), Some("7234567890123456789"));
    }

    #[tokio::test]
    async fn test_short_link_redirect_without_id() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(serve_redirect(listener, format!("http://{}/login", addr)));

        let id = TikTokPlan::new(local_client())
            .follow_short_link(&format!("http://{}/ZMabc123/", addr))
            .await;
        server.abort();

        assert!(id.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_short_link_is_none() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let id = TikTokPlan::new(local_client())
            .follow_short_link(&format!("http://{}/ZMabc123/", addr))
            .await;
        assert!(id.is_none());
    }

    #[tokio::test]
    async fn test_short_link_without_resolution_skips_crop_and_mobile() {
        let tools = tools();
        let network = NetworkConfig::default();
        let url = "https://vm.tiktok.com/ZMabc123/";
        let stages = TikTokPlan::offline()
            .stages(&ctx(url, Path::new("/tmp/tt"), &tools, &network))
            .await
            .unwrap();

        let kinds: Vec<StageKind> = stages.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, vec![StageKind::Direct, StageKind::BasicFormat]);
    }
}
