// yt-dlp argument builder
//
// Stages of one platform share a base command and differ only in a few
// flags, so the builder is Clone and each stage derives from the base.

use std::path::{Path, PathBuf};

use super::models::NetworkConfig;

pub const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

pub const MOBILE_USER_AGENT: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 14_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.0 Mobile/15E148 Safari/604.1";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct YtDlpCommand {
    format: Option<String>,
    output_template: Option<String>,
    ffmpeg_location: Option<PathBuf>,
    merge_output_format: Option<String>,
    write_info_json: bool,
    geo_bypass: bool,
    no_check_certificates: bool,
    user_agent: Option<String>,
    headers: Vec<String>,
    cookies_from_browser: Option<String>,
    proxy: Option<String>,
    socket_timeout: Option<u32>,
    add_metadata: bool,
    write_thumbnail: bool,
}

impl YtDlpCommand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn format(mut self, spec: &str) -> Self {
        self.format = Some(spec.to_string());
        self
    }

    /// `template` is joined onto `dir`, matching yt-dlp's `-o` semantics
    pub fn output(mut self, dir: &Path, template: &str) -> Self {
        self.output_template = Some(dir.join(template).to_string_lossy().into_owned());
        self
    }

    /// Directory containing ffmpeg (yt-dlp wants the folder, not the binary)
    pub fn ffmpeg_location(mut self, ffmpeg: Option<&Path>) -> Self {
        self.ffmpeg_location = ffmpeg.and_then(|p| p.parent()).map(Path::to_path_buf);
        self
    }

    pub fn merge_output_format(mut self, ext: &str) -> Self {
        self.merge_output_format = Some(ext.to_string());
        self
    }

    pub fn write_info_json(mut self, enabled: bool) -> Self {
        self.write_info_json = enabled;
        self
    }

    pub fn geo_bypass(mut self) -> Self {
        self.geo_bypass = true;
        self
    }

    pub fn no_check_certificates(mut self) -> Self {
        self.no_check_certificates = true;
        self
    }

    pub fn user_agent(mut self, ua: &str) -> Self {
        self.user_agent = Some(ua.to_string());
        self
    }

    /// Extra HTTP header in yt-dlp's `Name:Value` form
    pub fn header(mut self, header: &str) -> Self {
        self.headers.push(header.to_string());
        self
    }

    pub fn cookies_from_browser(mut self, browser: &str) -> Self {
        self.cookies_from_browser = Some(browser.to_string());
        self
    }

    pub fn add_metadata(mut self) -> Self {
        self.add_metadata = true;
        self
    }

    pub fn write_thumbnail(mut self) -> Self {
        self.write_thumbnail = true;
        self
    }

    pub fn network(mut self, config: &NetworkConfig) -> Self {
        self.proxy = config.proxy.clone();
        self.socket_timeout = config.socket_timeout;
        self
    }

    /// Final argument list; the URL is always the last element
    pub fn build(&self, url: &str) -> Vec<String> {
        let mut args = vec![
            "--no-warnings".to_string(),
            "--newline".to_string(),
            "--no-playlist".to_string(),
            // file mtime must reflect the download, not the upload
            "--no-mtime".to_string(),
        ];

        if let Some(dir) = &self.ffmpeg_location {
            args.push("--ffmpeg-location".to_string());
            args.push(dir.to_string_lossy().into_owned());
        }

        if let Some(format) = &self.format {
            args.push("-f".to_string());
            args.push(format.clone());
        }

        if let Some(ext) = &self.merge_output_format {
            args.push("--merge-output-format".to_string());
            args.push(ext.clone());
        }

        if let Some(template) = &self.output_template {
            args.push("-o".to_string());
            args.push(template.clone());
        }

        args.push(if self.write_info_json {
            "--write-info-json".to_string()
        } else {
            "--no-write-info-json".to_string()
        });

        if self.geo_bypass {
            args.push("--geo-bypass".to_string());
        }

        if let Some(ua) = &self.user_agent {
            args.push("--user-agent".to_string());
            args.push(ua.clone());
        }

        for header in &self.headers {
            args.push("--add-header".to_string());
            args.push(header.clone());
        }

        if self.no_check_certificates {
            args.push("--no-check-certificates".to_string());
        }

        if let Some(browser) = &self.cookies_from_browser {
            args.push("--cookies-from-browser".to_string());
            args.push(browser.clone());
        }

        if let Some(proxy) = &self.proxy {
            args.push("--proxy".to_string());
            args.push(proxy.clone());
        }

        if let Some(timeout) = self.socket_timeout {
            args.push("--socket-timeout".to_string());
            args.push(timeout.to_string());
        }

        if self.add_metadata {
            args.push("--add-metadata".to_string());
        }

        if self.write_thumbnail {
            args.push("--write-thumbnail".to_string());
        }

        args.push(url.to_string());
        args
    }
}

/// Value following `flag` in an argument list
pub fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}
