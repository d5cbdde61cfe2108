use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;

pub mod youtube;

use crate::Result;

/// Audio-only stream chosen for one video
#[derive(Debug, Clone)]
pub struct StreamSelection {
    /// Channel or uploader name, used as the artist tag
    pub artist: String,

    /// Video title
    pub title: String,

    /// Format identifier reported by the resolver
    pub format_id: String,

    /// Direct media URL of the stream
    pub stream_url: String,

    /// Container extension of the stream (webm, m4a, ...)
    pub ext: Option<String>,

    /// Average audio bitrate in kbit/s if known
    pub abr: Option<f64>,

    /// Size in bytes if known
    pub file_size: Option<u64>,

    /// Headers the resolver says the stream host expects
    pub http_headers: HashMap<String, String>,
}

impl StreamSelection {
    /// `artist-title`, before sanitising
    pub fn display_name(&self) -> String {
        format!("{}-{}", self.artist, self.title)
    }
}

/// External client that finds and fetches audio streams
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Find the best audio-only stream, `Ok(None)` when the video has none
    async fn resolve(&self, url: &str) -> Result<Option<StreamSelection>>;

    /// Download the selected stream to `dest`
    async fn download(&self, stream: &StreamSelection, dest: &Path) -> Result<()>;
}
