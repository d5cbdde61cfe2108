use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::ToolsConfig;
use crate::ConvertError;

/// Relaxed YouTube URL shape, anchored at the start only
static YOUTUBE_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(https?://)?(www\.)?(youtube\.com|youtu\.be)/.+")
        .expect("YouTube URL pattern is valid")
});

/// Characters kept by [`sanitize_filename`] besides alphanumerics
const ALLOWED_FILENAME_CHARS: &[char] = &[' ', '-', '[', ']', '(', ')', '&'];

/// Check whether a string looks like a youtube.com or youtu.be link
pub fn is_valid_youtube_url(url: &str) -> bool {
    YOUTUBE_URL.is_match(url)
}

/// Accept a YouTube URL, or reject it as [`ConvertError::InvalidUrl`]
pub fn validate_youtube_url(url: &str) -> Result<&str, ConvertError> {
    if is_valid_youtube_url(url) {
        Ok(url)
    } else {
        Err(ConvertError::InvalidUrl(url.to_string()))
    }
}

/// Drop every character that is not alphanumeric or in ` -[]()&`
pub fn sanitize_filename(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric() || ALLOWED_FILENAME_CHARS.contains(c))
        .collect()
}

/// Check if the current environment has required tools
pub async fn check_dependencies(tools: &ToolsConfig) -> Vec<String> {
    let mut missing = Vec::new();

    if !check_command_available(&tools.yt_dlp, "--version").await {
        missing.push(format!("{} - required to resolve YouTube streams", tools.yt_dlp));
    }

    if !check_command_available(&tools.ffmpeg, "-version").await {
        missing.push(format!("{} - required to convert audio to MP3", tools.ffmpeg));
    }

    missing
}

/// Check if a command is available in PATH
async fn check_command_available(command: &str, version_flag: &str) -> bool {
    use tokio::process::Command;

    Command::new(command)
        .arg(version_flag)
        .output()
        .await
        .map(|output| output.status.success())
        .unwrap_or(false)
}
