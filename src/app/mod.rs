//! Application state shared by the command handlers.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::time::sleep;

use crate::config::{Config, DelayConfig};
use crate::convert::{AudioExtractor, FfmpegTranscoder, Id3TagWriter};
use crate::pipeline::{queue::DownloadQueue, BatchReport, DownloadWorker};
use crate::source::youtube::YtDlpSource;
use crate::status::StatusReporter;
use crate::utils::validate_youtube_url;

/// Counts from reading a batch file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchSummary {
    /// Every line in the file, blank ones included
    pub total_lines: usize,
    pub enqueued: usize,
    pub invalid: usize,
}

pub struct App {
    queue: DownloadQueue,
    worker: DownloadWorker,
    reporter: Arc<dyn StatusReporter>,
    delays: DelayConfig,
}

impl App {
    pub fn new(worker: DownloadWorker, reporter: Arc<dyn StatusReporter>, delays: DelayConfig) -> Self {
        Self {
            queue: DownloadQueue::new(),
            worker,
            reporter,
            delays,
        }
    }

    /// Wire up yt-dlp, ffmpeg and ID3 tagging writing into `output_dir`
    pub fn from_config(
        config: &Config,
        output_dir: PathBuf,
        reporter: Arc<dyn StatusReporter>,
        show_progress: bool,
    ) -> Result<Self> {
        fs_err::create_dir_all(&output_dir).context("Failed to create output directory")?;

        let source = YtDlpSource::new(config, show_progress)?;
        let extractor = AudioExtractor::new(
            Arc::new(FfmpegTranscoder::new(config)),
            Arc::new(Id3TagWriter),
        );
        let worker = DownloadWorker::new(
            Arc::new(source),
            extractor,
            Arc::clone(&reporter),
            output_dir,
            config.delays.clone(),
        );

        Ok(Self::new(worker, reporter, config.delays.clone()))
    }

    pub fn queue(&self) -> &DownloadQueue {
        &self.queue
    }

    pub fn output_dir(&self) -> &Path {
        self.worker.output_dir()
    }

    /// Validate one URL, queue it and download it
    pub async fn download_single(&self, url: &str) -> BatchReport {
        if url.is_empty() {
            self.reporter.status("URL is empty");
            return BatchReport::default();
        }

        match validate_youtube_url(url) {
            Ok(url) => self.queue.enqueue(url),
            Err(e) => {
                self.reporter.error(&e.to_string());
                return BatchReport::default();
            }
        }

        self.worker.drain(&self.queue).await
    }

    /// Queue every valid URL in `contents`, one per line
    pub async fn enqueue_lines(&self, contents: &str) -> BatchSummary {
        let mut summary = BatchSummary::default();

        for line in contents.lines() {
            summary.total_lines += 1;

            let url = line.trim();
            if url.is_empty() {
                continue;
            }

            match validate_youtube_url(url) {
                Ok(url) => {
                    self.queue.enqueue(url);
                    summary.enqueued += 1;
                }
                Err(e) => {
                    self.reporter.error(&e.to_string());
                    summary.invalid += 1;
                    sleep(self.delays.status_hold()).await;
                }
            }
        }

        summary
    }

    /// Read a `.txt` batch file, queue its URLs and drain the queue
    pub async fn load_links_and_download(&self, path: &Path) -> Result<BatchReport> {
        let is_txt = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("txt"));
        if !is_txt {
            anyhow::bail!("Batch file must be a .txt file: {}", path.display());
        }

        let contents = fs_err::read_to_string(path).context("Failed to read batch file")?;
        let summary = self.enqueue_lines(&contents).await;
        tracing::debug!("Loaded {:?} from {}", summary, path.display());

        self.reporter.status(&format!(
            "Downloading {} of {} files...",
            summary.enqueued, summary.total_lines
        ));
        sleep(self.delays.status_hold()).await;

        Ok(self.worker.drain(&self.queue).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::MockTranscoder;
    use crate::source::MockMediaSource;
    use crate::status::testing::RecordingStatus;

    /// App whose source must never be asked for anything
    fn idle_app(dir: &Path, status: Arc<RecordingStatus>) -> App {
        let mut source = MockMediaSource::new();
        source.expect_resolve().times(0);
        source.expect_download().times(0);

        let worker = DownloadWorker::new(
            Arc::new(source),
            AudioExtractor::new(Arc::new(MockTranscoder::new()), Arc::new(Id3TagWriter)),
            status.clone(),
            dir.to_path_buf(),
            DelayConfig::none(),
        );
        App::new(worker, status, DelayConfig::none())
    }

    #[tokio::test]
    async fn test_empty_single_url() {
        let dir = tempfile::tempdir().unwrap();
        let status = Arc::new(RecordingStatus::default());
        let app = idle_app(dir.path(), status.clone());

        let report = app.download_single("").await;

        assert_eq!(report.processed(), 0);
        assert!(app.queue().is_empty());
        assert_eq!(app.queue().outstanding(), 0);
        assert_eq!(status.messages(), vec!["URL is empty"]);
        assert!(status.errors().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_single_url() {
        let dir = tempfile::tempdir().unwrap();
        let status = Arc::new(RecordingStatus::default());
        let app = idle_app(dir.path(), status.clone());

        app.download_single("https://vimeo.com/1").await;

        assert!(app.queue().is_empty());
        assert_eq!(status.errors(), vec!["Invalid URL format: https://vimeo.com/1"]);
    }

    #[tokio::test]
    async fn test_enqueue_lines_counts_valid_and_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let status = Arc::new(RecordingStatus::default());
        let app = idle_app(dir.path(), status.clone());

        let contents = "https://www.youtube.com/watch?v=a\n\
                        not a url\n\
                        youtu.be/b\n\
                        https://vimeo.com/c\n\
                        http://youtube.com/d\n";
        let summary = app.enqueue_lines(contents).await;

        assert_eq!(
            summary,
            BatchSummary {
                total_lines: 5,
                enqueued: 3,
                invalid: 2
            }
        );
        assert_eq!(app.queue().len(), 3);
        assert_eq!(
            status.errors(),
            vec![
                "Invalid URL format: not a url",
                "Invalid URL format: https://vimeo.com/c"
            ]
        );
        assert_eq!(app.queue().dequeue().as_deref(), Some("https://www.youtube.com/watch?v=a"));
    }

    #[tokio::test]
    async fn test_blank_lines_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let status = Arc::new(RecordingStatus::default());
        let app = idle_app(dir.path(), status.clone());

        let summary = app.enqueue_lines("\n   \n  youtu.be/x  \r\n").await;

        assert_eq!(summary.total_lines, 3);
        assert_eq!(summary.enqueued, 1);
        assert_eq!(summary.invalid, 0);
        assert_eq!(app.queue().dequeue().as_deref(), Some("youtu.be/x"));
    }

    #[tokio::test]
    async fn test_batch_file_must_be_txt() {
        let dir = tempfile::tempdir().unwrap();
        let status = Arc::new(RecordingStatus::default());
        let app = idle_app(dir.path(), status.clone());

        let path = dir.path().join("links.csv");
        std::fs::write(&path, "youtu.be/x\n").unwrap();

        assert!(app.load_links_and_download(&path).await.is_err());
        assert!(app.queue().is_empty());
    }

    #[tokio::test]
    async fn test_batch_of_invalid_lines_reports_summary() {
        let dir = tempfile::tempdir().unwrap();
        let status = Arc::new(RecordingStatus::default());
        let app = idle_app(dir.path(), status.clone());

        let path = dir.path().join("links.TXT");
        std::fs::write(&path, "nope\nhttps://vimeo.com/x\n").unwrap();

        let report = app.load_links_and_download(&path).await.unwrap();

        assert_eq!(report.processed(), 0);
        assert_eq!(status.errors().len(), 2);
        assert_eq!(
            status.messages().last().map(String::as_str),
            Some("Downloading 0 of 2 files...")
        );
    }
}
