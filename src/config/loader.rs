//! Configuration structures and loading logic.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::download::BatchPlan;
use crate::episode::detect_episode;
use crate::error::{Error, Result};

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// What to download. Normally filled from the command line.
    #[serde(default)]
    pub target: TargetConfig,

    #[serde(default)]
    pub browser: BrowserConfig,

    #[serde(default)]
    pub capture: CaptureConfig,

    #[serde(default)]
    pub download: DownloadConfig,

    #[serde(default)]
    pub batch: BatchConfig,
}

/// Series targeting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Template player URL for one episode of the series.
    #[serde(default)]
    pub url: String,

    /// Custom series name used for output files instead of the page title.
    #[serde(default)]
    pub name: Option<String>,

    /// Number of episodes to download.
    #[serde(default = "default_episodes")]
    pub episodes: u32,

    /// First episode to download. Detected from the URL when unset.
    #[serde(default)]
    pub start: Option<u32>,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            name: None,
            episodes: default_episodes(),
            start: None,
        }
    }
}

/// Headless browser configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Run without a visible window.
    #[serde(default = "default_true")]
    pub headless: bool,

    /// Explicit Chrome/Chromium executable. Auto-detected when unset.
    #[serde(default)]
    pub chrome_executable: Option<PathBuf>,

    /// Browser user agent string.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_viewport_width")]
    pub viewport_width: u32,

    #[serde(default = "default_viewport_height")]
    pub viewport_height: u32,

    /// Upper bound for a page load.
    #[serde(default = "default_navigation_timeout")]
    pub navigation_timeout_secs: u64,

    /// Pause after a page load so client-side players can initialize.
    #[serde(default = "default_settle_delay")]
    pub settle_delay_ms: u64,

    /// Upper bound for a single play-control click.
    #[serde(default = "default_click_timeout")]
    pub click_timeout_secs: u64,

    /// Pause after a successful click.
    #[serde(default = "default_post_click_delay")]
    pub post_click_delay_ms: u64,

    /// Play-control selectors, tried in order.
    #[serde(default = "default_play_selectors")]
    pub play_selectors: Vec<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            chrome_executable: None,
            user_agent: default_user_agent(),
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
            navigation_timeout_secs: default_navigation_timeout(),
            settle_delay_ms: default_settle_delay(),
            click_timeout_secs: default_click_timeout(),
            post_click_delay_ms: default_post_click_delay(),
            play_selectors: default_play_selectors(),
        }
    }
}

impl BrowserConfig {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn click_timeout(&self) -> Duration {
        Duration::from_secs(self.click_timeout_secs)
    }

    pub fn post_click_delay(&self) -> Duration {
        Duration::from_millis(self.post_click_delay_ms)
    }
}

/// Manifest capture configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Case-insensitive substring identifying manifest requests.
    #[serde(default = "default_manifest_marker")]
    pub manifest_marker: String,

    /// How long to wait for a manifest after navigation.
    #[serde(default = "default_manifest_timeout")]
    pub manifest_timeout_secs: u64,

    /// Capture buffer polling cadence.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            manifest_marker: default_manifest_marker(),
            manifest_timeout_secs: default_manifest_timeout(),
            poll_interval_ms: default_poll_interval(),
        }
    }
}

impl CaptureConfig {
    pub fn manifest_timeout(&self) -> Duration {
        Duration::from_secs(self.manifest_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Muxer and output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// ffmpeg binary name or path.
    #[serde(default = "default_ffmpeg_binary")]
    pub ffmpeg_binary: String,

    /// Output media extension (without dot).
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Upper bound for one ffmpeg run.
    #[serde(default = "default_download_timeout")]
    pub download_timeout_secs: u64,

    /// Output directory. Created when missing.
    #[serde(default)]
    pub output_directory: Option<PathBuf>,

    /// Show a spinner while ffmpeg runs.
    #[serde(default = "default_true")]
    pub show_progress: bool,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            ffmpeg_binary: default_ffmpeg_binary(),
            extension: default_extension(),
            download_timeout_secs: default_download_timeout(),
            output_directory: None,
            show_progress: true,
        }
    }
}

impl DownloadConfig {
    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }
}

/// Batch pacing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Pause between consecutive episodes.
    #[serde(default = "default_pacing_delay")]
    pub pacing_delay_secs: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            pacing_delay_secs: default_pacing_delay(),
        }
    }
}

impl BatchConfig {
    pub fn pacing_delay(&self) -> Duration {
        Duration::from_secs(self.pacing_delay_secs)
    }
}

fn default_true() -> bool {
    true
}

fn default_episodes() -> u32 {
    1
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string()
}

fn default_viewport_width() -> u32 {
    1920
}

fn default_viewport_height() -> u32 {
    1080
}

fn default_navigation_timeout() -> u64 {
    30
}

fn default_settle_delay() -> u64 {
    3000
}

fn default_click_timeout() -> u64 {
    5
}

fn default_post_click_delay() -> u64 {
    2000
}

fn default_play_selectors() -> Vec<String> {
    [
        ".play",
        "[class*=\"play\"]",
        "button[class*=\"play\"]",
        ".play-btn",
        ".video-play",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_manifest_marker() -> String {
    ".m3u8".to_string()
}

fn default_manifest_timeout() -> u64 {
    30
}

fn default_poll_interval() -> u64 {
    1000
}

fn default_ffmpeg_binary() -> String {
    "ffmpeg".to_string()
}

fn default_extension() -> String {
    "mp4".to_string()
}

fn default_download_timeout() -> u64 {
    3600
}

fn default_pacing_delay() -> u64 {
    3
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::Config(format!(
                    "Configuration file not found: {}",
                    path.display()
                ))
            } else {
                Error::Io(e)
            }
        })?;

        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load the first configuration file that exists, or the defaults.
    ///
    /// An explicitly requested path must exist. Otherwise `config.toml` in
    /// the working directory is tried, then the per-user config directory.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        for candidate in default_config_paths() {
            if candidate.is_file() {
                tracing::debug!("Loading configuration from {}", candidate.display());
                return Self::load(&candidate);
            }
        }

        Ok(Self::default())
    }

    /// First episode: explicit start, else the number embedded in the URL, else 1.
    pub fn start_episode(&self) -> u32 {
        self.target
            .start
            .or_else(|| detect_episode(&self.target.url))
            .unwrap_or(1)
    }

    /// The batch described by the target section.
    pub fn batch_plan(&self) -> BatchPlan {
        BatchPlan {
            template_url: self.target.url.clone(),
            start: self.start_episode(),
            count: self.target.episodes,
            custom_name: self
                .target
                .name
                .clone()
                .filter(|name| !name.trim().is_empty()),
        }
    }

    /// Get the effective output directory.
    pub fn output_directory(&self) -> PathBuf {
        self.download
            .output_directory
            .clone()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }
}

/// Candidate configuration locations, most specific first.
pub fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(CONFIG_FILE_NAME)];
    if let Some(dirs) = ProjectDirs::from("", "", "episode-grabber") {
        paths.push(dirs.config_dir().join(CONFIG_FILE_NAME));
    }
    paths
}
