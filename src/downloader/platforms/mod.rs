// Per-platform download plans
//
// A plan turns a validated URL into the ordered list of stages the
// sequencer tries, and says how the result should be reported.

use async_trait::async_trait;
use std::path::Path;

use super::errors::Result;
use super::models::{NetworkConfig, Platform, Quality};
use super::stages::Stage;
use super::tools::ResolvedTools;

pub mod facebook;
pub mod instagram;
pub mod tiktok;
pub mod twitter;
pub mod youtube;

pub use facebook::FacebookPlan;
pub use instagram::InstagramPlan;
pub use tiktok::TikTokPlan;
pub use twitter::TwitterPlan;
pub use youtube::YouTubePlan;

/// Everything a plan needs to build its stages
#[derive(Debug, Clone, Copy)]
pub struct PlanContext<'a> {
    pub url: &'a str,
    pub quality: Quality,
    pub output_dir: &'a Path,
    pub tools: &'a ResolvedTools,
    pub network: &'a NetworkConfig,
}

/// How the downloaded file is found and described afterwards
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportPolicy {
    /// Extensions accepted when falling back to the newest-file search
    pub extensions: &'static [&'static str],
    /// Read and delete the `.info.json` sidecar
    pub read_sidecar: bool,
    /// Report WIDTHxHEIGHT via ffprobe
    pub probe_dimensions: bool,
}

impl Default for ReportPolicy {
    fn default() -> Self {
        Self {
            extensions: &["mp4", "webm", "mkv"],
            read_sidecar: false,
            probe_dimensions: false,
        }
    }
}

#[async_trait]
pub trait PlatformPlan: Send + Sync {
    fn platform(&self) -> Platform;

    /// Stages in the order they are tried
    async fn stages(&self, ctx: &PlanContext<'_>) -> Result<Vec<Stage>>;

    fn report_policy(&self) -> ReportPolicy {
        ReportPolicy::default()
    }
}

/// Plan for `platform`. `http` is used by plans that must resolve
/// short links before building their stages.
pub fn plan_for(platform: Platform, http: &reqwest::Client) -> Box<dyn PlatformPlan> {
    match platform {
        Platform::YouTube => Box::new(YouTubePlan),
        Platform::Facebook => Box::new(FacebookPlan),
        Platform::Instagram => Box::new(InstagramPlan),
        Platform::TikTok => Box::new(TikTokPlan::new(http.clone())),
        Platform::Twitter => Box::new(TwitterPlan),
    }
}
