//! tube2mp3 - A Rust CLI tool for converting YouTube videos into tagged MP3 files
//!
//! This library provides a small sequential pipeline: URLs are validated and queued,
//! an audio-only stream is resolved and downloaded for each one, transcoded to MP3
//! with ffmpeg and tagged with the video's artist and title.

pub mod app;
pub mod cli;
pub mod config;
pub mod convert;
pub mod pipeline;
pub mod source;
pub mod status;
pub mod utils;

pub use app::App;
pub use cli::{Cli, Commands};
pub use config::Config;
pub use convert::AudioExtractor;
pub use pipeline::{queue::DownloadQueue, BatchReport, DownloadWorker};
pub use source::{MediaSource, StreamSelection};
pub use status::StatusReporter;

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Reasons a single download task can fail
#[derive(thiserror::Error, Debug)]
pub enum ConvertError {
    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),

    #[error("No audio stream found for URL: {0}")]
    StreamUnavailable(String),

    #[error("Error downloading from URL: {url}. Error: {reason}")]
    DownloadFailure { url: String, reason: String },

    #[error("No temporary file found for url: {0}")]
    MissingTemporaryFile(String),

    #[error("Error extracting audio: {0}")]
    ExtractionFailure(String),
}
