use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "tube2mp3",
    about = "tube2mp3 - Convert YouTube videos into tagged MP3 files",
    version,
    long_about = "Downloads the audio-only stream of YouTube videos, converts it to MP3 with ffmpeg and tags the result with the video's artist and title. Accepts a single URL or a text file with one URL per line."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file to use instead of the default location
    #[arg(long, global = true, env = "TUBE2MP3_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory for finished MP3 files (overrides the configuration)
    #[arg(short, long, global = true, env = "TUBE2MP3_OUTPUT_DIR", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download and convert a single YouTube URL
    Single {
        /// YouTube URL (youtube.com or youtu.be)
        #[arg(value_name = "URL", default_value = "")]
        url: String,
    },

    /// Load URLs from a text file (one per line) and download them in order
    Batch {
        /// Path to a .txt file with one URL per line
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Show or initialise the configuration
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,
    },
}
