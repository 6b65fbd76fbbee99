//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

use social_downloader_lib::downloader::{Platform, Quality};

/// Download videos from YouTube, Facebook, Instagram, TikTok and Twitter/X.
///
/// Wraps yt-dlp and ffmpeg and retries blocked downloads with alternative
/// strategies (browser cookies, mobile site, basic formats).
#[derive(Parser, Debug)]
#[command(name = "social-downloader")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Directory for log files (default: ~/Downloads/VideoDownloader_Logs)
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    /// Log to stderr only
    #[arg(long, global = true)]
    pub no_log_file: bool,

    /// Configuration file (default: <config dir>/social-downloader/config.json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Download a single video
    Download(DownloadArgs),

    /// Prompt for URLs until 'q' is entered
    Interactive {
        /// Only accept URLs of this platform
        #[arg(short, long)]
        platform: Option<Platform>,
    },

    /// Show located yt-dlp / ffmpeg / ffprobe binaries
    Tools {
        /// Write the located paths into the configuration file
        #[arg(long)]
        save: bool,
    },
}

#[derive(ClapArgs, Debug)]
pub struct DownloadArgs {
    /// Video URL
    pub url: String,

    /// Platform (youtube, facebook, instagram, tiktok, twitter); detected from the URL by default
    #[arg(short, long)]
    pub platform: Option<Platform>,

    /// Quality: best, medium (<=720p) or worst
    #[arg(short = 'Q', long, default_value_t = Quality::Best)]
    pub quality: Quality,

    /// Output directory (default: ~/Downloads/<Platform>_Videos)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Only run the first download strategy
    #[arg(long)]
    pub no_fallback: bool,

    /// Browser to read cookies from in the cookie fallback stage
    #[arg(long)]
    pub cookies_browser: Option<String>,

    /// Proxy URL (e.g. socks5://127.0.0.1:1080)
    #[arg(long)]
    pub proxy: Option<String>,

    /// Kill yt-dlp/ffmpeg after this many seconds
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Print the result as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn download_args(args: Args) -> DownloadArgs {
        match args.command {
            Command::Download(d) => d,
            other => panic!("expected download command, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_download_defaults() {
        let args = Args::try_parse_from(["social-downloader", "download", "https://youtu.be/abc"]).unwrap();
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
        let d = download_args(args);
        assert_eq!(d.url, "https://youtu.be/abc");
        assert_eq!(d.quality, Quality::Best);
        assert!(d.platform.is_none());
        assert!(!d.no_fallback);
    }

    #[test]
    fn test_cli_download_options() {
        let args = Args::try_parse_from([
            "social-downloader",
            "download",
            "https://vm.tiktok.com/ZMabc/",
            "-p",
            "tiktok",
            "-Q",
            "medium",
            "-o",
            "/tmp/out",
            "--no-fallback",
            "--cookies-browser",
            "firefox",
        ])
        .unwrap();
        let d = download_args(args);
        assert_eq!(d.platform, Some(Platform::TikTok));
        assert_eq!(d.quality, Quality::Medium);
        assert_eq!(d.output, Some(PathBuf::from("/tmp/out")));
        assert!(d.no_fallback);
        assert_eq!(d.cookies_browser.as_deref(), Some("firefox"));
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let args = Args::try_parse_from(["social-downloader", "tools", "-vv", "--no-log-file"]).unwrap();
        assert_eq!(args.verbose, 2);
        assert!(args.no_log_file);
        assert!(matches!(args.command, Command::Tools { save: false }));
    }

    #[test]
    fn test_cli_tools_save() {
        let args = Args::try_parse_from(["social-downloader", "tools", "--save"]).unwrap();
        assert!(matches!(args.command, Command::Tools { save: true }));
    }

    #[test]
    fn test_cli_quiet_flag_sets_quiet() {
        let args = Args::try_parse_from(["social-downloader", "-q", "interactive", "-p", "x"]).unwrap();
        assert!(args.quiet);
        assert!(matches!(
            args.command,
            Command::Interactive {
                platform: Some(Platform::Twitter)
            }
        ));
    }

    #[test]
    fn test_cli_rejects_unknown_quality() {
        let result = Args::try_parse_from(["social-downloader", "download", "u", "-Q", "4k"]);
        assert_eq!(result.unwrap_err().kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_requires_subcommand() {
        let result = Args::try_parse_from(["social-downloader"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let result = Args::try_parse_from(["social-downloader", "--help"]);
        assert_eq!(result.unwrap_err().kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_timeout_zero_rejected() {
        let result = Args::try_parse_from(["social-downloader", "download", "u", "--timeout", "0"]);
        assert_eq!(result.unwrap_err().kind(), clap::error::ErrorKind::ValueValidation);
    }
}
