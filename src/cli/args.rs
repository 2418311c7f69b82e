//! Command-line argument definitions using clap.

use clap::Parser;
use std::path::PathBuf;

use crate::config::Config;

/// Sequential episode downloader CLI.
#[derive(Parser, Debug)]
#[command(
    name = "episode-grabber",
    version,
    about = "Download sequential video episodes from web player pages",
    long_about = "Opens each episode's player page in headless Chrome, captures the HLS manifest \
                  the player requests, and saves the stream with ffmpeg.\n\n\
                  Episode URLs are derived from the given URL, e.g. .../269747-1-1.html -> \
                  .../269747-1-2.html."
)]
pub struct Args {
    /// Player page URL of one episode (e.g. https://example.com/play/269747-1-1.html).
    #[arg(short, long)]
    pub url: Option<String>,

    /// Custom series name; files are named <NAME>_Episode<N>.mp4.
    #[arg(short, long)]
    pub name: Option<String>,

    /// Number of episodes to download.
    #[arg(short, long)]
    pub episodes: Option<u32>,

    /// First episode. Detected from the URL when omitted.
    #[arg(short, long)]
    pub start: Option<u32>,

    /// Output directory (created if missing).
    #[arg(short = 'd', long = "directory")]
    pub output_directory: Option<PathBuf>,

    /// Path to configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// ffmpeg binary name or path.
    #[arg(long, env = "EPISODE_GRABBER_FFMPEG")]
    pub ffmpeg: Option<String>,

    /// Chrome/Chromium executable.
    #[arg(long, env = "EPISODE_GRABBER_CHROME")]
    pub chrome: Option<PathBuf>,

    /// Show the browser window.
    #[arg(long)]
    pub headed: bool,

    /// Output file extension.
    #[arg(long)]
    pub extension: Option<String>,

    /// Seconds to wait for a manifest per episode.
    #[arg(long)]
    pub manifest_timeout: Option<u64>,

    /// Seconds to pause between episodes.
    #[arg(long)]
    pub delay: Option<u64>,

    /// Hide download progress information.
    #[arg(long, short)]
    pub quiet: bool,

    /// Enable debug logging.
    #[arg(long)]
    pub debug: bool,
}

impl Args {
    /// Merge CLI arguments into an existing config, overriding where specified.
    pub fn merge_into_config(self, config: &mut Config) {
        if let Some(url) = self.url {
            config.target.url = url.trim().to_string();
        }

        if let Some(name) = self.name {
            config.target.name = Some(name);
        }

        if let Some(episodes) = self.episodes {
            config.target.episodes = episodes;
        }

        if let Some(start) = self.start {
            config.target.start = Some(start);
        }

        if let Some(dir) = self.output_directory {
            config.download.output_directory = Some(dir);
        }

        if let Some(ffmpeg) = self.ffmpeg {
            config.download.ffmpeg_binary = ffmpeg;
        }

        if let Some(chrome) = self.chrome {
            config.browser.chrome_executable = Some(chrome);
        }

        if let Some(extension) = self.extension {
            config.download.extension = extension;
        }

        if let Some(timeout) = self.manifest_timeout {
            config.capture.manifest_timeout_secs = timeout;
        }

        if let Some(delay) = self.delay {
            config.batch.pacing_delay_secs = delay;
        }

        // Boolean flags (only override if set to non-default)
        if self.headed {
            config.browser.headless = false;
        }

        if self.quiet {
            config.download.show_progress = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_short_flags() {
        let args = Args::try_parse_from([
            "episode-grabber",
            "-u",
            "https://example.com/play/269747-1-1.html",
            "-n",
            "MySeries",
            "-e",
            "2",
            "-s",
            "1",
            "-d",
            "downloads",
        ])
        .unwrap();

        assert_eq!(args.episodes, Some(2));
        assert_eq!(args.start, Some(1));
        assert_eq!(args.output_directory, Some(PathBuf::from("downloads")));
    }

    #[test]
    fn test_merge_overrides_only_given_values() {
        let mut config = Config::default();
        config.batch.pacing_delay_secs = 10;
        config.download.extension = "mkv".to_string();

        let args = Args::try_parse_from([
            "episode-grabber",
            "--url",
            " https://example.com/play/1-1-4.html ",
            "--headed",
            "--quiet",
            "--manifest-timeout",
            "60",
        ])
        .unwrap();
        args.merge_into_config(&mut config);

        assert_eq!(config.target.url, "https://example.com/play/1-1-4.html");
        assert_eq!(config.target.start, None);
        assert_eq!(config.target.episodes, 1);
        assert!(!config.browser.headless);
        assert!(!config.download.show_progress);
        assert_eq!(config.capture.manifest_timeout_secs, 60);
        assert_eq!(config.batch.pacing_delay_secs, 10);
        assert_eq!(config.download.extension, "mkv");
    }
}
