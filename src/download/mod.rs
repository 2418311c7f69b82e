//! Download module for episode processing.
//!
//! This module provides:
//! - Episode and batch state tracking
//! - Stream saving through ffmpeg
//! - The single-episode pipeline
//! - Sequential batch processing with pacing

pub mod batch;
pub mod muxer;
pub mod processor;
pub mod state;

pub use batch::{interrupt_on, BatchPlan, BatchRunner};
pub use muxer::{DownloadOutcome, FfmpegMuxer, MuxError, Muxer};
pub use processor::{EpisodeProcessor, ProcessorSettings, NO_MANIFEST};
pub use state::{BatchStats, EpisodeOutcome, EpisodeState};
