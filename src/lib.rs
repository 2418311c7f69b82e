//! Episode Grabber - sequential episode downloads from web player pages.
//!
//! Given the player URL of one episode, the library derives the URLs of the
//! following episodes, loads each page in a headless Chrome session, captures
//! the HLS manifest the player requests and saves the stream through ffmpeg.
//!
//! # Features
//!
//! - Episode URL derivation (`269747-1-1.html` -> `269747-1-2.html`, plus
//!   trailing-number fallbacks)
//! - Network capture through CDP request interception
//! - Series-aware output naming
//! - Sequential batches with pacing and cancellation
//!
//! # Example
//!
//! ```no_run
//! use std::path::PathBuf;
//! use episode_grabber::{
//!     BatchRunner, ChromeSession, Config, EpisodeProcessor, FfmpegMuxer, ManifestObserver,
//!     ProcessorSettings,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.target.url = "https://example.com/play/269747-1-1.html".to_string();
//!     config.target.episodes = 2;
//!
//!     let observer = ManifestObserver::new(
//!         &config.capture.manifest_marker,
//!         config.capture.poll_interval(),
//!     );
//!     let session = ChromeSession::launch(&config.browser, observer).await?;
//!     let muxer = FfmpegMuxer::new(&config.download);
//!
//!     let settings = ProcessorSettings::from_config(&config, PathBuf::from("."));
//!     let runner = BatchRunner::new(
//!         EpisodeProcessor::new(&session, &muxer, settings),
//!         config.batch.pacing_delay(),
//!     );
//!     let stats = runner.run(&config.batch_plan(), std::future::pending()).await;
//!     println!("{} of {} succeeded", stats.succeeded, stats.attempted);
//!     Ok(())
//! }
//! ```

pub mod browser;
pub mod cli;
pub mod config;
pub mod download;
pub mod episode;
pub mod error;
pub mod fs;
pub mod output;

// Re-exports for convenience
pub use browser::{BrowserSession, ChromeSession, ManifestObserver};
pub use config::Config;
pub use download::{
    BatchPlan, BatchRunner, BatchStats, EpisodeOutcome, EpisodeProcessor, FfmpegMuxer, Muxer,
    ProcessorSettings,
};
pub use episode::{derive, detect_episode, DerivedUrl, EpisodeRequest};
pub use error::{Error, Result};
