//! Console prompts for the interactive mode.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use social_downloader_lib::config::AppConfig;
use social_downloader_lib::downloader::format_selector::FormatSelector;
use social_downloader_lib::downloader::validation::resolve_platform;
use social_downloader_lib::downloader::{DownloadRequest, Platform, Quality};

/// One trimmed line, or None at end of input
fn read_line<R: BufRead>(input: &mut R) -> io::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn ask<R: BufRead, W: Write>(input: &mut R, output: &mut W, prompt: &str) -> io::Result<Option<String>> {
    write!(output, "{}", prompt)?;
    output.flush()?;
    read_line(input)
}

/// Only an explicit no; Enter or anything else keeps the default
pub fn is_no(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "n" | "no")
}

/// Custom directory if it exists, otherwise the default
pub fn choose_directory(custom: &str, default: &Path) -> (PathBuf, bool) {
    let candidate = PathBuf::from(custom.trim());
    if !custom.trim().is_empty() && candidate.is_dir() {
        (candidate, true)
    } else {
        (default.to_path_buf(), false)
    }
}

/// Ask for URL, quality and directory. Returns None when the user quits
/// ('q') or input ends.
pub fn prompt_request<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    platform: Option<Platform>,
    config: &AppConfig,
) -> io::Result<Option<DownloadRequest>> {
    let label = platform.map(|p| p.display_name()).unwrap_or("video");

    let (url, platform) = loop {
        let url = match ask(input, output, &format!("\nEnter {} URL (or 'q' to quit): ", label))? {
            None => return Ok(None),
            Some(u) if u.eq_ignore_ascii_case("q") => return Ok(None),
            Some(u) if u.is_empty() => continue,
            Some(u) => u,
        };

        match resolve_platform(&url, platform) {
            Ok(p) => break (url, p),
            Err(e) => writeln!(output, "{}. Please try again.", e)?,
        }
    };

    writeln!(output, "\nSelect quality:")?;
    for (n, quality) in [Quality::Best, Quality::Medium, Quality::Worst].iter().enumerate() {
        writeln!(output, "  {}. {}", n + 1, FormatSelector::menu_label(*quality))?;
    }
    let choice = ask(input, output, "Choose quality (1-3, Enter = best): ")?.unwrap_or_default();
    let quality = Quality::from_menu_choice(&choice);

    let default_dir = config.platform_dir(platform);
    let use_default = ask(
        input,
        output,
        &format!("Use default download directory ({})? (y/n): ", default_dir.display()),
    )?
    .unwrap_or_default();

    let directory = if is_no(&use_default) {
        let custom = ask(input, output, "Enter custom directory path: ")?.unwrap_or_default();
        let (dir, accepted) = choose_directory(&custom, &default_dir);
        if !accepted {
            writeln!(output, "Directory does not exist, using default: {}", dir.display())?;
        }
        dir
    } else {
        default_dir
    };

    Ok(Some(
        DownloadRequest::new(url, quality, directory).with_platform(Some(platform)),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn config(root: &Path) -> AppConfig {
        AppConfig {
            download_root: Some(root.to_path_buf()),
            ..Default::default()
        }
    }

    #[test]
    fn test_quit() {
        let mut input = Cursor::new("q\n");
        let mut output = Vec::new();
        let req = prompt_request(&mut input, &mut output, None, &AppConfig::default()).unwrap();
        assert!(req.is_none());
    }

    #[test]
    fn test_full_prompt_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let mut input = Cursor::new("\nhttps://www.instagram.com/p/Cx1AbC2dEf3/\n2\ny\n");
        let mut output = Vec::new();
        let req = prompt_request(&mut input, &mut output, None, &config(dir.path()))
            .unwrap()
            .unwrap();

        assert_eq!(req.platform, Some(Platform::Instagram));
        assert_eq!(req.quality, Quality::Medium);
        assert_eq!(req.output_directory, dir.path().join("Instagram_Videos"));
    }

    #[test]
    fn test_invalid_url_reprompts() {
        let dir = tempfile::tempdir().unwrap();
        let mut input = Cursor::new("https://www.tiktok.com/\nhttps://vm.tiktok.com/ZMabc123/\n\ny\n");
        let mut output = Vec::new();
        let req = prompt_request(&mut input, &mut output, Some(Platform::TikTok), &config(dir.path()))
            .unwrap()
            .unwrap();

        assert_eq!(req.url, "https://vm.tiktok.com/ZMabc123/");
        assert_eq!(req.quality, Quality::Best);
        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("Invalid TikTok URL"));
    }

    #[test]
    fn test_custom_directory_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let custom = dir.path().join("mine");
        std::fs::create_dir(&custom).unwrap();

        let script = format!("https://x.com/a/status/1\n3\nn\n{}\n", custom.display());
        let mut input = Cursor::new(script);
        let mut output = Vec::new();
        let req = prompt_request(&mut input, &mut output, None, &config(dir.path()))
            .unwrap()
            .unwrap();
        assert_eq!(req.output_directory, custom);
        assert_eq!(req.quality, Quality::Worst);

        let mut input = Cursor::new("https://x.com/a/status/1\n1\nn\n/definitely/missing\n");
        let mut output = Vec::new();
        let req = prompt_request(&mut input, &mut output, None, &config(dir.path()))
            .unwrap()
            .unwrap();
        assert_eq!(req.output_directory, dir.path().join("Twitter_Videos"));
    }

    #[test]
    fn test_enter_keeps_default_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut input = Cursor::new("https://x.com/a/status/1\n\n\n");
        let mut output = Vec::new();
        let req = prompt_request(&mut input, &mut output, None, &config(dir.path()))
            .unwrap()
            .unwrap();

        assert_eq!(req.output_directory, dir.path().join("Twitter_Videos"));
        let text = String::from_utf8(output).unwrap();
        assert!(!text.contains("Enter custom directory path"));
    }

    #[test]
    fn test_is_no() {
        assert!(is_no("N"));
        assert!(is_no(" no "));
        assert!(!is_no(""));
        assert!(!is_no("y"));
        assert!(!is_no("maybe"));
    }
}
