// FormatSelector - maps a Quality preference to yt-dlp format selectors
//
// YouTube prefers mp4/m4a streams so the merged file plays everywhere.
// The other platforms serve a handful of progressive formats, so the plain
// bestvideo/bestaudio selectors are enough.

use super::models::{Platform, Quality};

pub struct FormatSelector;

impl FormatSelector {
    /// Format selector for the first (direct) stage
    pub fn get_format_spec(platform: Platform, quality: Quality) -> &'static str {
        match platform {
            Platform::YouTube => match quality {
                Quality::Best => "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best",
                Quality::Medium => {
                    "bestvideo[height<=720][ext=mp4]+bestaudio[ext=m4a]/best[height<=720][ext=mp4]/best[height<=720]"
                }
                Quality::Worst => "worstvideo[ext=mp4]+worstaudio[ext=m4a]/worst[ext=mp4]/worst",
            },
            _ => match quality {
                Quality::Best => "bestvideo+bestaudio/best",
                Quality::Medium => "bestvideo[height<=720]+bestaudio/best[height<=720]",
                Quality::Worst => "worstvideo+worstaudio/worst",
            },
        }
    }

    /// Most permissive selector, used by the last-resort stage
    pub fn basic_format(platform: Platform) -> &'static str {
        match platform {
            // single pre-muxed file, no merge step needed
            Platform::TikTok => "b",
            _ => "best",
        }
    }

    /// Label shown in the interactive quality menu
    pub fn menu_label(quality: Quality) -> &'static str {
        match quality {
            Quality::Best => "Best quality (default)",
            Quality::Medium => "Medium quality (720p)",
            Quality::Worst => "Worst quality (saves bandwidth)",
        }
    }
}
