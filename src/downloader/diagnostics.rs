// Blocking diagnostics - identifies why a platform refused a download
//
// Analyzes yt-dlp error text to determine:
// - Type of blocking (403, geo, login wall, etc.)
// - Recommended action for the user

use serde::{Deserialize, Serialize};

/// Reasons why a platform might refuse a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockingReason {
    /// HTTP 403 Forbidden - general access denied
    Http403Forbidden,

    /// Geographic restriction
    GeoBlocked,

    /// Content needs a logged-in session (Instagram/Facebook login wall,
    /// age gate, NSFW tweets)
    LoginRequired,

    /// Private post or account
    PrivateContent,

    /// Rate limiting (429 or similar)
    RateLimited,

    /// Post deleted or unavailable
    VideoUnavailable,

    /// Network timeout (soft IP block)
    NetworkTimeout,

    /// yt-dlp has no extractor for the URL
    UnsupportedUrl,

    /// Requested format selector matched nothing
    FormatUnavailable,

    /// Generic/unknown blocking
    Unknown,
}

impl BlockingReason {
    /// Check if cookies might help
    pub fn cookies_might_help(&self) -> bool {
        matches!(
            self,
            Self::Http403Forbidden | Self::LoginRequired | Self::PrivateContent
        )
    }

    /// Check if proxy might help
    pub fn proxy_might_help(&self) -> bool {
        matches!(
            self,
            Self::Http403Forbidden | Self::GeoBlocked | Self::NetworkTimeout | Self::RateLimited
        )
    }

    /// Check if this is a permanent restriction (no workaround)
    pub fn is_permanent(&self) -> bool {
        matches!(self, Self::VideoUnavailable | Self::UnsupportedUrl)
    }

    /// CLI options worth retrying with. Empty for permanent failures.
    pub fn retry_hints(&self, proxy_configured: bool) -> Vec<&'static str> {
        if self.is_permanent() {
            return Vec::new();
        }
        let mut hints = Vec::new();
        if self.cookies_might_help() {
            hints.push("--cookies-browser <firefox|chrome|edge|safari> with a logged-in browser");
        }
        if self.proxy_might_help() && !proxy_configured {
            hints.push("--proxy <URL> (e.g. socks5://127.0.0.1:1080)");
        }
        hints
    }

    /// Human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::Http403Forbidden => "Access denied (HTTP 403)",
            Self::GeoBlocked => "Geographic restriction",
            Self::LoginRequired => "Login required",
            Self::PrivateContent => "Private content",
            Self::RateLimited => "Rate limited by the platform",
            Self::VideoUnavailable => "Video unavailable",
            Self::NetworkTimeout => "Network timeout (possible IP throttling)",
            Self::UnsupportedUrl => "URL not supported by yt-dlp",
            Self::FormatUnavailable => "Requested format not available",
            Self::Unknown => "Unknown blocking reason",
        }
    }

    /// What the user can try next
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::Http403Forbidden => {
                "Update yt-dlp (yt-dlp -U) and try again with --cookies-browser set to a logged-in browser"
            }
            Self::GeoBlocked => "Try again through a proxy or VPN located in an allowed region (--proxy)",
            Self::LoginRequired | Self::PrivateContent => {
                "Log in to the platform in your browser and pass it with --cookies-browser"
            }
            Self::RateLimited => "Wait a few minutes before retrying, or switch network/proxy",
            Self::VideoUnavailable => "The post was removed or is no longer public",
            Self::NetworkTimeout => "Check your connection; a proxy may help if the host throttles you",
            Self::UnsupportedUrl => "Check that the link points at a single video post",
            Self::FormatUnavailable => "Retry with a lower quality (-Q medium or -Q worst)",
            Self::Unknown => "Update yt-dlp (yt-dlp -U); platforms change often",
        }
    }
}

/// Analyze error message and return blocking reason
pub fn diagnose_error(error: &str) -> Option<BlockingReason> {
    if error.trim().is_empty() {
        return None;
    }
    let lower = error.to_lowercase();

    // Check patterns in order of specificity

    if lower.contains("unsupported url") {
        return Some(BlockingReason::UnsupportedUrl);
    }

    if lower.contains("requested format is not available") || lower.contains("no video formats found") {
        return Some(BlockingReason::FormatUnavailable);
    }

    if lower.contains("private video")
        || lower.contains("this account is private")
        || lower.contains("video is private")
        || lower.contains("protected tweets")
    {
        return Some(BlockingReason::PrivateContent);
    }

    if lower.contains("login required")
        || lower.contains("log in")
        || lower.contains("login")
        || lower.contains("sign in")
        || lower.contains("age-restricted")
        || lower.contains("cookies")
    {
        return Some(BlockingReason::LoginRequired);
    }

    if lower.contains("video unavailable")
        || lower.contains("video is unavailable")
        || lower.contains("has been removed")
        || lower.contains("no longer available")
        || lower.contains("http error 404")
        || lower.contains("not found")
    {
        return Some(BlockingReason::VideoUnavailable);
    }

    if lower.contains("not available in your country")
        || lower.contains("geo restricted")
        || lower.contains("geo-restricted")
        || lower.contains("blocked in your country")
    {
        return Some(BlockingReason::GeoBlocked);
    }

    if lower.contains("429") || lower.contains("rate limit") || lower.contains("too many requests") {
        return Some(BlockingReason::RateLimited);
    }

    if lower.contains("403") || lower.contains("forbidden") {
        return Some(BlockingReason::Http403Forbidden);
    }

    if lower.contains("timeout")
        || lower.contains("timed out")
        || lower.contains("connection refused")
        || lower.contains("network unreachable")
        || lower.contains("connection reset")
    {
        return Some(BlockingReason::NetworkTimeout);
    }

    Some(BlockingReason::Unknown)
}
