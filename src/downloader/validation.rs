// URL validation and URL rewriting used by fallback stages

use regex::Regex;

use super::errors::{DownloadError, Result};
use super::models::Platform;

lazy_static::lazy_static! {
    static ref YOUTUBE_PATTERNS: Vec<Regex> = compile(&[
        r"^https?://(?:www\.)?youtube\.com/shorts/([a-zA-Z0-9_-]+)(?:\?.*)?$",
        r"^https?://(?:www\.)?youtube\.com/watch\?v=([a-zA-Z0-9_-]+)(?:&.*)?$",
        r"^https?://(?:www\.)?youtu\.be/([a-zA-Z0-9_-]+)(?:\?.*)?$",
    ]);

    static ref FACEBOOK_PATTERNS: Vec<Regex> = compile(&[
        r"^https?://(www\.|m\.|web\.)?facebook\.com/[^/]+/videos/[0-9]+",
        r"^https?://(www\.|m\.|web\.)?facebook\.com/watch\?v=[0-9]+",
        r"^https?://(www\.|m\.|web\.)?facebook\.com/[^/]+/posts/[0-9]+",
        r"^https?://(www\.|m\.|web\.)?facebook\.com/[^/]+/videos/[^/]+/[0-9]+",
        r"^https?://(www\.|m\.|web\.)?facebook\.com/watch/live/\?v=[0-9]+",
        r"^https?://(www\.|m\.|web\.)?fb\.watch/[a-zA-Z0-9_-]+/?",
        r"^https?://(www\.|m\.|web\.)?facebook\.com/reel/[0-9]+",
        r"^https?://(www\.|m\.|web\.)?facebook\.com/story\.php\?story_fbid=[0-9]+&id=[0-9]+",
    ]);

    static ref INSTAGRAM_PATTERNS: Vec<Regex> = compile(&[
        r"^https?://(www\.)?instagram\.com/p/[a-zA-Z0-9_-]+/?",
        r"^https?://(www\.)?instagram\.com/reel/[a-zA-Z0-9_-]+/?",
        r"^https?://(www\.)?instagram\.com/stories/[a-zA-Z0-9_.]+/[0-9]+/?",
        r"^https?://(www\.)?instagram\.com/tv/[a-zA-Z0-9_-]+/?",
        r"^https?://(www\.)?instagr\.am/p/[a-zA-Z0-9_-]+/?",
        r"^https?://(www\.)?instagr\.am/reel/[a-zA-Z0-9_-]+/?",
    ]);

    static ref TIKTOK_PATTERNS: Vec<Regex> = compile(&[
        r"^https?://(www\.|vm\.)?tiktok\.com/(@[^/]+/video/\d+|[A-Za-z0-9]+/?)",
        r"^https?://m\.tiktok\.com/v/\d+",
        r"^https?://(www\.)?tiktok\.com/t/[A-Za-z0-9]+/?",
    ]);

    static ref TWITTER_PATTERNS: Vec<Regex> = compile(&[
        r"^https?://(?:www\.)?twitter\.com/\w+/status/\d+(?:\?.*)?$",
        r"^https?://(?:www\.)?x\.com/\w+/status/\d+(?:\?.*)?$",
        r"^https?://(?:mobile\.)?twitter\.com/\w+/status/\d+(?:\?.*)?$",
        r"^https?://(?:mobile\.)?x\.com/\w+/status/\d+(?:\?.*)?$",
    ]);

    static ref HOST_RE: Regex = Regex::new(r"^https?://([^/?#:]+)").unwrap();
    static ref TIKTOK_VIDEO_ID_RE: Regex = Regex::new(r"tiktok\.com/@[^/]+/video/(\d+)").unwrap();
    static ref TIKTOK_MOBILE_ID_RE: Regex = Regex::new(r"m\.tiktok\.com/v/(\d+)").unwrap();
}

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("static URL pattern must compile"))
        .collect()
}

fn patterns_for(platform: Platform) -> &'static [Regex] {
    match platform {
        Platform::YouTube => &YOUTUBE_PATTERNS,
        Platform::Facebook => &FACEBOOK_PATTERNS,
        Platform::Instagram => &INSTAGRAM_PATTERNS,
        Platform::TikTok => &TIKTOK_PATTERNS,
        Platform::Twitter => &TWITTER_PATTERNS,
    }
}

/// True if `url` matches one of the documented path shapes for `platform`
pub fn is_valid_url(platform: Platform, url: &str) -> bool {
    let url = url.trim();
    patterns_for(platform).iter().any(|re| re.is_match(url))
}

/// Lowercased host of an http(s) URL
pub fn host_of(url: &str) -> Option<String> {
    HOST_RE
        .captures(url.trim())
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_lowercase())
}

fn host_matches(host: &str, domain: &str) -> bool {
    host == domain || host.ends_with(&format!(".{}", domain))
}

/// Guess the platform from the URL host, without validating the path
pub fn platform_for_host(url: &str) -> Option<Platform> {
    let host = host_of(url)?;
    let table: [(&str, Platform); 9] = [
        ("youtube.com", Platform::YouTube),
        ("youtu.be", Platform::YouTube),
        ("facebook.com", Platform::Facebook),
        ("fb.watch", Platform::Facebook),
        ("instagram.com", Platform::Instagram),
        ("instagr.am", Platform::Instagram),
        ("tiktok.com", Platform::TikTok),
        ("twitter.com", Platform::Twitter),
        ("x.com", Platform::Twitter),
    ];
    table
        .iter()
        .find(|(domain, _)| host_matches(&host, domain))
        .map(|(_, platform)| *platform)
}

/// Resolve and validate the platform for a request.
///
/// An explicit platform wins over host detection. Fails before any
/// subprocess is started.
pub fn resolve_platform(url: &str, explicit: Option<Platform>) -> Result<Platform> {
    let platform = match explicit.or_else(|| platform_for_host(url)) {
        Some(p) => p,
        None => return Err(DownloadError::UnsupportedUrl(url.to_string())),
    };

    if !is_valid_url(platform, url) {
        return Err(DownloadError::InvalidUrl {
            platform,
            url: url.to_string(),
        });
    }

    Ok(platform)
}

/// Same URL on the platform's mobile subdomain.
/// Returns None when the platform has no mobile host or the URL is already mobile.
pub fn mobile_url(platform: Platform, url: &str) -> Option<String> {
    let host = host_of(url)?;
    let (bare, mobile) = match platform {
        Platform::Facebook => ("facebook.com", "m.facebook.com"),
        Platform::TikTok => ("tiktok.com", "m.tiktok.com"),
        Platform::YouTube => ("youtube.com", "m.youtube.com"),
        Platform::Twitter => ("twitter.com", "mobile.twitter.com"),
        Platform::Instagram => return None,
    };

    if host == mobile || !host_matches(&host, bare) || host.starts_with("vm.") {
        return None;
    }

    // Host is either the bare domain or www./web. + domain
    let idx = url.find(&host)?;
    let mut rewritten = String::with_capacity(url.len() + 2);
    rewritten.push_str(&url[..idx]);
    rewritten.push_str(mobile);
    rewritten.push_str(&url[idx + host.len()..]);
    Some(rewritten)
}

/// Numeric TikTok video id, if present in the URL itself
pub fn tiktok_video_id(url: &str) -> Option<String> {
    TIKTOK_VIDEO_ID_RE
        .captures(url)
        .or_else(|| TIKTOK_MOBILE_ID_RE.captures(url))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Shortened TikTok link that must be resolved by following redirects
pub fn is_tiktok_short_link(url: &str) -> bool {
    url.contains("vm.tiktok.com") || url.contains("tiktok.com/t/")
}
