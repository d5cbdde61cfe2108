use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::time::sleep;

pub mod queue;
pub mod temp;

use crate::config::DelayConfig;
use crate::convert::AudioExtractor;
use crate::source::MediaSource;
use crate::status::StatusReporter;
use crate::utils::sanitize_filename;
use crate::ConvertError;
use queue::DownloadQueue;
use temp::{remove_if_present, TempVideo, TEMP_VIDEO_NAME};

/// Outcome of draining the queue
#[derive(Debug, Default)]
pub struct BatchReport {
    /// MP3 files written, in queue order
    pub completed: Vec<PathBuf>,

    /// URLs that failed and why
    pub failed: Vec<(String, ConvertError)>,
}

impl BatchReport {
    pub fn processed(&self) -> usize {
        self.completed.len() + self.failed.len()
    }
}

/// Sequential download-and-convert loop
pub struct DownloadWorker {
    source: Arc<dyn MediaSource>,
    extractor: AudioExtractor,
    reporter: Arc<dyn StatusReporter>,
    output_dir: PathBuf,
    delays: DelayConfig,
}

impl DownloadWorker {
    pub fn new(
        source: Arc<dyn MediaSource>,
        extractor: AudioExtractor,
        reporter: Arc<dyn StatusReporter>,
        output_dir: PathBuf,
        delays: DelayConfig,
    ) -> Self {
        Self {
            source,
            extractor,
            reporter,
            output_dir,
            delays,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Process queued URLs one at a time until the queue is empty.
    ///
    /// A failing URL is reported and skipped; it never stops the batch.
    pub async fn drain(&self, queue: &DownloadQueue) -> BatchReport {
        let mut report = BatchReport::default();

        while let Some(url) = queue.dequeue() {
            match self.process(&url).await {
                Ok(audio_file) => report.completed.push(audio_file),
                Err(e) => {
                    self.reporter.error(&e.to_string());
                    report.failed.push((url, e));
                }
            }

            queue.task_done();
            sleep(self.delays.between_tasks()).await;
        }

        tracing::info!(
            "Queue drained: {} converted, {} failed",
            report.completed.len(),
            report.failed.len()
        );
        report
    }

    async fn process(&self, url: &str) -> Result<PathBuf, ConvertError> {
        self.reporter.status("Downloading next audio file");

        let stream = self
            .source
            .resolve(url)
            .await
            .map_err(|e| download_failure(url, e))?
            .ok_or_else(|| ConvertError::StreamUnavailable(url.to_string()))?;

        let filename = sanitize_filename(&stream.display_name());
        let audio_file = self.output_dir.join(format!("{}.mp3", filename));
        let temp_path = self.output_dir.join(TEMP_VIDEO_NAME);

        remove_if_present(&temp_path).map_err(|e| download_failure(url, e.into()))?;

        if let Err(e) = self.source.download(&stream, &temp_path).await {
            if let Err(cleanup) = remove_if_present(&temp_path) {
                tracing::warn!("Failed to remove partial download: {}", cleanup);
            }
            return Err(download_failure(url, e));
        }

        let temp_video = TempVideo::claim(&temp_path)
            .ok_or_else(|| ConvertError::MissingTemporaryFile(url.to_string()))?;

        self.reporter
            .status(&format!("Extracting audio from {}...", filename));

        self.extractor
            .extract(temp_video, &audio_file, &stream.artist, &stream.title)
            .await?;

        self.reporter.status(&format!("Downloaded {}", filename));
        sleep(self.delays.after_success()).await;

        Ok(audio_file)
    }
}

fn download_failure(url: &str, error: anyhow::Error) -> ConvertError {
    ConvertError::DownloadFailure {
        url: url.to_string(),
        reason: format!("{:#}", error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::{Id3TagWriter, MockTranscoder};
    use crate::source::{MockMediaSource, StreamSelection};
    use crate::status::testing::RecordingStatus;
    use id3::TagLike;
    use std::collections::HashMap;

    fn stream_for(artist: &str, title: &str) -> StreamSelection {
        StreamSelection {
            artist: artist.to_string(),
            title: title.to_string(),
            format_id: "251".to_string(),
            stream_url: format!("https://media.example/{}", title),
            ext: Some("webm".to_string()),
            abr: Some(128.0),
            file_size: None,
            http_headers: HashMap::new(),
        }
    }

    fn copying_transcoder() -> MockTranscoder {
        let mut transcoder = MockTranscoder::new();
        transcoder.expect_transcode().returning(|source, dest| {
            std::fs::copy(source, dest)?;
            Ok(())
        });
        transcoder
    }

    fn writing_download(source: &mut MockMediaSource) {
        source.expect_download().returning(|_, dest: &Path| {
            std::fs::write(dest, b"fake video")?;
            Ok(())
        });
    }

    fn worker(
        source: MockMediaSource,
        transcoder: MockTranscoder,
        status: Arc<RecordingStatus>,
        dir: &Path,
    ) -> DownloadWorker {
        DownloadWorker::new(
            Arc::new(source),
            AudioExtractor::new(Arc::new(transcoder), Arc::new(Id3TagWriter)),
            status,
            dir.to_path_buf(),
            DelayConfig::none(),
        )
    }

    #[tokio::test]
    async fn test_successful_task_writes_tagged_mp3() {
        let dir = tempfile::tempdir().unwrap();
        let status = Arc::new(RecordingStatus::default());

        let mut source = MockMediaSource::new();
        source
            .expect_resolve()
            .times(1)
            .returning(|_| Ok(Some(stream_for("Guns N' Roses", "Sweet Child O' Mine!"))));
        writing_download(&mut source);

        let worker = worker(source, copying_transcoder(), status.clone(), dir.path());
        let queue = DownloadQueue::new();
        queue.enqueue("https://youtu.be/v4xZUr0BEfE");

        let report = worker.drain(&queue).await;

        let expected = dir.path().join("Guns N Roses-Sweet Child O Mine.mp3");
        assert_eq!(report.completed, vec![expected.clone()]);
        assert!(report.failed.is_empty());
        assert!(!dir.path().join(TEMP_VIDEO_NAME).exists());

        let tag = id3::Tag::read_from_path(&expected).unwrap();
        assert_eq!(tag.artist(), Some("Guns N' Roses"));
        assert_eq!(tag.title(), Some("Sweet Child O' Mine!"));

        assert_eq!(
            status.messages(),
            vec![
                "Downloading next audio file",
                "Extracting audio from Guns N Roses-Sweet Child O Mine...",
                "Downloaded Guns N Roses-Sweet Child O Mine",
            ]
        );
        assert!(status.errors().is_empty());
        assert_eq!(queue.outstanding(), 0);
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_the_batch() {
        let dir = tempfile::tempdir().unwrap();
        let status = Arc::new(RecordingStatus::default());

        let mut source = MockMediaSource::new();
        source.expect_resolve().returning(|url| {
            if url.contains("broken") {
                Err(anyhow::anyhow!("connection reset"))
            } else {
                Ok(Some(stream_for("Artist", &url[url.len() - 1..])))
            }
        });
        writing_download(&mut source);

        let worker = worker(source, copying_transcoder(), status.clone(), dir.path());
        let queue = DownloadQueue::new();
        queue.enqueue("youtu.be/a");
        queue.enqueue("youtu.be/broken");
        queue.enqueue("youtu.be/c");

        let report = worker.drain(&queue).await;

        assert_eq!(report.processed(), 3);
        assert_eq!(report.completed.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "youtu.be/broken");
        assert!(matches!(report.failed[0].1, ConvertError::DownloadFailure { .. }));
        assert!(queue.is_empty());
        assert_eq!(queue.outstanding(), 0);

        assert_eq!(
            status.errors(),
            vec!["Error downloading from URL: youtu.be/broken. Error: connection reset"]
        );
        assert!(dir.path().join("Artist-c.mp3").exists());
    }

    #[tokio::test]
    async fn test_no_audio_stream() {
        let dir = tempfile::tempdir().unwrap();
        let status = Arc::new(RecordingStatus::default());

        let mut source = MockMediaSource::new();
        source.expect_resolve().returning(|_| Ok(None));
        source.expect_download().times(0);

        let worker = worker(source, MockTranscoder::new(), status.clone(), dir.path());
        let queue = DownloadQueue::new();
        queue.enqueue("youtu.be/x");

        let report = worker.drain(&queue).await;

        assert!(matches!(report.failed[0].1, ConvertError::StreamUnavailable(_)));
        assert_eq!(status.errors(), vec!["No audio stream found for URL: youtu.be/x"]);
    }

    #[tokio::test]
    async fn test_download_error_removes_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let status = Arc::new(RecordingStatus::default());

        let mut source = MockMediaSource::new();
        source
            .expect_resolve()
            .returning(|_| Ok(Some(stream_for("a", "t"))));
        source.expect_download().returning(|_, dest: &Path| {
            std::fs::write(dest, b"half")?;
            Err(anyhow::anyhow!("HTTP 403"))
        });

        let worker = worker(source, MockTranscoder::new(), status.clone(), dir.path());
        let queue = DownloadQueue::new();
        queue.enqueue("youtu.be/x");

        let report = worker.drain(&queue).await;

        assert!(matches!(
            &report.failed[0].1,
            ConvertError::DownloadFailure { reason, .. } if reason == "HTTP 403"
        ));
        assert!(!dir.path().join(TEMP_VIDEO_NAME).exists());
    }

    #[tokio::test]
    async fn test_missing_temporary_file() {
        let dir = tempfile::tempdir().unwrap();
        let status = Arc::new(RecordingStatus::default());

        let mut source = MockMediaSource::new();
        source
            .expect_resolve()
            .returning(|_| Ok(Some(stream_for("a", "t"))));
        source.expect_download().returning(|_, _| Ok(()));

        let mut transcoder = MockTranscoder::new();
        transcoder.expect_transcode().times(0);

        let worker = worker(source, transcoder, status.clone(), dir.path());
        let queue = DownloadQueue::new();
        queue.enqueue("youtu.be/x");

        let report = worker.drain(&queue).await;

        assert!(matches!(report.failed[0].1, ConvertError::MissingTemporaryFile(_)));
        assert_eq!(status.errors(), vec!["No temporary file found for url: youtu.be/x"]);
    }

    #[tokio::test]
    async fn test_extraction_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let status = Arc::new(RecordingStatus::default());

        let mut source = MockMediaSource::new();
        source
            .expect_resolve()
            .returning(|_| Ok(Some(stream_for("a", "t"))));
        writing_download(&mut source);

        let mut transcoder = MockTranscoder::new();
        transcoder
            .expect_transcode()
            .returning(|_, _| Err(anyhow::anyhow!("unsupported codec")));

        let worker = worker(source, transcoder, status.clone(), dir.path());
        let queue = DownloadQueue::new();
        queue.enqueue("youtu.be/x");

        let report = worker.drain(&queue).await;

        assert!(report.completed.is_empty());
        assert!(matches!(report.failed[0].1, ConvertError::ExtractionFailure(_)));
        assert!(!dir.path().join(TEMP_VIDEO_NAME).exists());
        assert!(!status.messages().iter().any(|m| m.starts_with("Downloaded")));
    }
}
