use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name of the folder created for finished MP3 files
const DEFAULT_OUTPUT_FOLDER: &str = "MP3 Downloaded";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory for finished MP3 files, the temporary video and the error log
    pub output_dir: Option<PathBuf>,

    /// Pauses applied by the download loop
    pub delays: DelayConfig,

    /// External programs
    pub tools: ToolsConfig,

    /// MP3 encoding settings
    pub audio: AudioConfig,

    /// Network settings for the stream download
    pub network: NetworkConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DelayConfig {
    /// Pause after every task, successful or not
    pub between_tasks_secs: u64,

    /// Extra pause after a successful task
    pub after_success_secs: u64,

    /// How long batch-loading notices stay on screen
    pub status_hold_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// yt-dlp executable used to resolve streams
    pub yt_dlp: String,

    /// ffmpeg executable used to transcode
    pub ffmpeg: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// MP3 bitrate passed to ffmpeg
    pub bitrate: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Accept invalid TLS certificates when fetching streams
    pub skip_certificate_check: bool,

    /// Time allowed to establish a connection to the stream host
    pub connect_timeout_secs: u64,

    /// A download fails once no data has arrived for this long
    pub stall_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: None,
            delays: DelayConfig::default(),
            tools: ToolsConfig::default(),
            audio: AudioConfig::default(),
            network: NetworkConfig::default(),
        }
    }
}

impl Default for DelayConfig {
    fn default() -> Self {
        Self {
            between_tasks_secs: 2,
            after_success_secs: 5,
            status_hold_secs: 4,
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            yt_dlp: "yt-dlp".to_string(),
            ffmpeg: "ffmpeg".to_string(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            bitrate: "192k".to_string(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            skip_certificate_check: true,
            connect_timeout_secs: 30,
            stall_timeout_secs: 60,
        }
    }
}

impl NetworkConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn stall_timeout(&self) -> Duration {
        Duration::from_secs(self.stall_timeout_secs)
    }
}

impl DelayConfig {
    /// Zero delays, for tests and scripted runs
    pub fn none() -> Self {
        Self {
            between_tasks_secs: 0,
            after_success_secs: 0,
            status_hold_secs: 0,
        }
    }

    pub fn between_tasks(&self) -> Duration {
        Duration::from_secs(self.between_tasks_secs)
    }

    pub fn after_success(&self) -> Duration {
        Duration::from_secs(self.after_success_secs)
    }

    pub fn status_hold(&self) -> Duration {
        Duration::from_secs(self.status_hold_secs)
    }
}

impl Config {
    /// Load configuration from file or create default
    pub async fn load(explicit: Option<&Path>) -> Result<Self> {
        let config_path = Self::config_path(explicit)?;

        if config_path.exists() {
            let content = fs_err::read_to_string(&config_path)
                .context("Failed to read config file")?;

            let config: Config = serde_yaml::from_str(&content)
                .context("Failed to parse config file")?;

            config.validate()?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to(&config_path)?;
            tracing::debug!("Wrote default configuration to {}", config_path.display());
            Ok(config)
        }
    }

    /// Save configuration to file
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs_err::create_dir_all(parent)?;
            }
        }

        let content = serde_yaml::to_string(self)
            .context("Failed to serialize config")?;

        fs_err::write(config_path, content)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Get configuration file path
    pub fn config_path(explicit: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = explicit {
            return Ok(path.to_path_buf());
        }

        // First try current directory for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?;

        Ok(config_dir.join("tube2mp3").join("config.yaml"))
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.tools.yt_dlp.trim().is_empty() {
            anyhow::bail!("tools.yt_dlp must name an executable");
        }

        if self.tools.ffmpeg.trim().is_empty() {
            anyhow::bail!("tools.ffmpeg must name an executable");
        }

        if self.audio.bitrate.trim().is_empty() {
            anyhow::bail!("audio.bitrate must not be empty");
        }

        if self.network.stall_timeout_secs == 0 {
            anyhow::bail!("network.stall_timeout_secs must be at least 1");
        }

        Ok(())
    }

    /// Resolve the output directory, falling back to `<Desktop>/MP3 Downloaded`
    pub fn output_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.output_dir {
            return Ok(dir.clone());
        }

        let desktop = dirs::desktop_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join("Desktop")))
            .context("Could not determine home directory")?;

        Ok(desktop.join(DEFAULT_OUTPUT_FOLDER))
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        match self.output_dir() {
            Ok(dir) => println!("  Output Directory: {}", dir.display()),
            Err(e) => println!("  Output Directory: <unavailable: {}>", e),
        }
        println!(
            "  Delays: {}s between tasks, {}s after success, {}s status hold",
            self.delays.between_tasks_secs,
            self.delays.after_success_secs,
            self.delays.status_hold_secs
        );
        println!("  yt-dlp: {}", self.tools.yt_dlp);
        println!("  ffmpeg: {}", self.tools.ffmpeg);
        println!("  Bitrate: {}", self.audio.bitrate);
        println!("  Skip Certificate Check: {}", self.network.skip_certificate_check);
        println!(
            "  Network Timeouts: {}s connect, {}s without data",
            self.network.connect_timeout_secs, self.network.stall_timeout_secs
        );
    }
}
