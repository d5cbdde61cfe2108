use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;

use super::Transcoder;
use crate::config::Config;
use crate::Result;

/// MP3 transcoding through the ffmpeg executable
pub struct FfmpegTranscoder {
    ffmpeg_path: String,
    bitrate: String,
}

impl FfmpegTranscoder {
    pub fn new(config: &Config) -> Self {
        Self {
            ffmpeg_path: config.tools.ffmpeg.clone(),
            bitrate: config.audio.bitrate.clone(),
        }
    }

    fn args(&self, source: &Path, dest: &Path) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-i".to_string(),
            source.to_string_lossy().into_owned(),
            "-vn".to_string(), // No video
            "-acodec".to_string(),
            "libmp3lame".to_string(),
            "-ab".to_string(),
            self.bitrate.clone(),
            dest.to_string_lossy().into_owned(),
        ]
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn transcode(&self, source: &Path, dest: &Path) -> Result<()> {
        tracing::debug!("Converting {} to MP3", source.display());

        let output = Command::new(&self.ffmpeg_path)
            .args(self.args(source, dest))
            .output()
            .await?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("Failed to convert file with ffmpeg: {}", error.trim());
        }

        Ok(())
    }
}
