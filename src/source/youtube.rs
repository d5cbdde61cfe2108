use anyhow::Context;
use async_trait::async_trait;
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

use super::{MediaSource, StreamSelection};
use crate::config::Config;
use crate::Result;

/// Subset of `yt-dlp --dump-json` output used to pick a stream
#[derive(Debug, Deserialize)]
struct VideoInfo {
    title: Option<String>,
    channel: Option<String>,
    uploader: Option<String>,
    #[serde(default)]
    formats: Vec<FormatInfo>,
}

#[derive(Debug, Clone, Deserialize)]
struct FormatInfo {
    format_id: String,
    url: Option<String>,
    acodec: Option<String>,
    vcodec: Option<String>,
    ext: Option<String>,
    protocol: Option<String>,
    abr: Option<f64>,
    filesize: Option<u64>,
    filesize_approx: Option<u64>,
    #[serde(default)]
    http_headers: HashMap<String, String>,
}

impl FormatInfo {
    /// Has audio, has no video, and can be fetched with a plain GET
    fn is_audio_only(&self) -> bool {
        let has_audio = self.acodec.as_deref().is_some_and(|codec| codec != "none");
        let no_video = self.vcodec.as_deref() == Some("none");
        let plain_http = matches!(self.protocol.as_deref(), None | Some("http") | Some("https"));

        has_audio && no_video && plain_http && self.url.is_some()
    }
}

/// YouTube stream resolver using yt-dlp, with downloads over reqwest
pub struct YtDlpSource {
    yt_dlp_path: String,
    skip_certificate_check: bool,
    stall_timeout: Duration,
    client: reqwest::Client,
    show_progress: bool,
}

impl YtDlpSource {
    pub fn new(config: &Config, show_progress: bool) -> Result<Self> {
        // No overall timeout: long videos arrive slowly but steadily
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(config.network.skip_certificate_check)
            .connect_timeout(config.network.connect_timeout())
            .build()
            .context("Failed to build HTTP client")?;

        if config.network.skip_certificate_check {
            tracing::warn!("TLS certificate verification is disabled for stream downloads");
        }

        Ok(Self {
            yt_dlp_path: config.tools.yt_dlp.clone(),
            skip_certificate_check: config.network.skip_certificate_check,
            stall_timeout: config.network.stall_timeout(),
            client,
            show_progress,
        })
    }

    fn info_args(&self, url: &str) -> Vec<String> {
        let mut args = vec![
            "--dump-json".to_string(),
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
        ];
        if self.skip_certificate_check {
            args.push("--no-check-certificates".to_string());
        }
        args.push(url.to_string());
        args
    }

    /// Get video information using yt-dlp
    async fn get_video_info(&self, url: &str) -> Result<VideoInfo> {
        tracing::debug!("Extracting video info for: {}", url);

        let output = Command::new(&self.yt_dlp_path)
            .args(self.info_args(url))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .with_context(|| format!("Failed to run {}", self.yt_dlp_path))?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("yt-dlp failed: {}", error.trim());
        }

        let info: VideoInfo = serde_json::from_slice(&output.stdout)
            .context("Failed to parse yt-dlp output")?;

        Ok(info)
    }

    fn stalled(&self) -> anyhow::Error {
        anyhow::anyhow!(
            "Download stalled: no data received for {}s",
            self.stall_timeout.as_secs()
        )
    }
}

/// Pick the audio-only format with the highest bitrate, first one on ties
fn select_audio_stream(info: VideoInfo) -> Option<StreamSelection> {
    let mut best: Option<&FormatInfo> = None;
    for format in info.formats.iter().filter(|f| f.is_audio_only()) {
        let better = match best {
            None => true,
            Some(current) => format.abr.unwrap_or(0.0) > current.abr.unwrap_or(0.0),
        };
        if better {
            best = Some(format);
        }
    }

    let format = best?.clone();
    let artist = info
        .channel
        .or(info.uploader)
        .unwrap_or_else(|| "Unknown Artist".to_string());
    let title = info.title.unwrap_or_else(|| "Untitled".to_string());

    Some(StreamSelection {
        artist,
        title,
        format_id: format.format_id,
        stream_url: format.url?,
        ext: format.ext,
        abr: format.abr,
        file_size: format.filesize.or(format.filesize_approx),
        http_headers: format.http_headers,
    })
}

#[async_trait]
impl MediaSource for YtDlpSource {
    async fn resolve(&self, url: &str) -> Result<Option<StreamSelection>> {
        let info = self.get_video_info(url).await?;
        let selection = select_audio_stream(info);

        if let Some(stream) = &selection {
            tracing::debug!(
                "Selected format {} ({:?}, {:?} kbit/s) for {}",
                stream.format_id,
                stream.ext,
                stream.abr,
                url
            );
        }

        Ok(selection)
    }

    async fn download(&self, stream: &StreamSelection, dest: &Path) -> Result<()> {
        let mut request = self.client.get(&stream.stream_url);
        for (name, value) in &stream.http_headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = timeout(self.stall_timeout, request.send())
            .await
            .map_err(|_| self.stalled())??;

        if !response.status().is_success() {
            anyhow::bail!("Failed to download audio: HTTP {}", response.status());
        }

        let total_size = response.content_length().or(stream.file_size).unwrap_or(0);
        let progress = if self.show_progress {
            ProgressBar::new(total_size)
        } else {
            ProgressBar::hidden()
        };
        progress.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        progress.set_message("Downloading audio...");

        let mut file = fs_err::File::create(dest)?;
        let mut downloaded = 0u64;
        let mut body = response.bytes_stream();

        // The stall timer restarts with every chunk
        while let Some(chunk) = timeout(self.stall_timeout, body.next())
            .await
            .map_err(|_| self.stalled())?
        {
            let chunk = chunk?;
            file.write_all(&chunk)?;
            downloaded += chunk.len() as u64;
            progress.set_position(downloaded);
        }
        file.flush()?;

        progress.finish_and_clear();
        tracing::debug!("Downloaded {} bytes to {}", downloaded, dest.display());

        Ok(())
    }
}
