use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

pub mod ffmpeg;
pub mod tags;

pub use ffmpeg::FfmpegTranscoder;
pub use tags::{Id3TagWriter, TagWriter};

use crate::pipeline::temp::TempVideo;
use crate::{ConvertError, Result};

/// External engine that turns a downloaded stream into an MP3
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transcoder: Send + Sync {
    async fn transcode(&self, source: &Path, dest: &Path) -> Result<()>;
}

/// Converts the temporary download into a tagged MP3
pub struct AudioExtractor {
    transcoder: Arc<dyn Transcoder>,
    tagger: Arc<dyn TagWriter>,
}

impl AudioExtractor {
    pub fn new(transcoder: Arc<dyn Transcoder>, tagger: Arc<dyn TagWriter>) -> Self {
        Self { transcoder, tagger }
    }

    /// Transcode `source` into `dest`, delete the source, then tag `dest`.
    ///
    /// Takes ownership of the temporary file; it is removed whether or not
    /// extraction succeeds.
    pub async fn extract(
        &self,
        source: TempVideo,
        dest: &Path,
        artist: &str,
        title: &str,
    ) -> std::result::Result<(), ConvertError> {
        tracing::debug!("Extracting {} -> {}", source.path().display(), dest.display());

        self.transcoder
            .transcode(source.path(), dest)
            .await
            .map_err(|e| ConvertError::ExtractionFailure(format!("{:#}", e)))?;

        source.remove().map_err(|e| ConvertError::ExtractionFailure(e.to_string()))?;

        self.tagger
            .write_tags(dest, artist, title)
            .map_err(|e| ConvertError::ExtractionFailure(format!("{:#}", e)))?;

        Ok(())
    }
}
