//! Episode and batch state tracking.

use std::fmt;
use std::path::PathBuf;

/// Processing stage of one episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EpisodeState {
    #[default]
    Deriving,
    Navigating,
    AwaitingManifest,
    Resolved,
    Downloading,
    Done,
    Failed,
}

impl EpisodeState {
    /// Whether processing has finished, successfully or not.
    pub fn is_terminal(&self) -> bool {
        matches!(self, EpisodeState::Done | EpisodeState::Failed)
    }
}

impl fmt::Display for EpisodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EpisodeState::Deriving => write!(f, "deriving"),
            EpisodeState::Navigating => write!(f, "navigating"),
            EpisodeState::AwaitingManifest => write!(f, "awaiting manifest"),
            EpisodeState::Resolved => write!(f, "resolved"),
            EpisodeState::Downloading => write!(f, "downloading"),
            EpisodeState::Done => write!(f, "done"),
            EpisodeState::Failed => write!(f, "failed"),
        }
    }
}

/// Result of processing one episode.
#[derive(Debug, Clone, Default)]
pub struct EpisodeOutcome {
    pub episode_number: u32,
    pub url: String,
    pub filename: Option<String>,
    pub manifest_url: Option<String>,
    pub output_path: Option<PathBuf>,
    pub state: EpisodeState,
    pub error: Option<String>,
}

impl EpisodeOutcome {
    pub fn new(episode_number: u32) -> Self {
        Self {
            episode_number,
            ..Default::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.state == EpisodeState::Done
    }

    /// Move to `next`, logging the transition.
    pub fn advance(&mut self, next: EpisodeState) {
        tracing::debug!(
            "Episode {}: {} -> {}",
            self.episode_number,
            self.state,
            next
        );
        self.state = next;
    }

    /// Finish as failed with `reason`.
    pub fn fail(mut self, reason: impl Into<String>) -> Self {
        self.advance(EpisodeState::Failed);
        self.error = Some(reason.into());
        self
    }
}

/// Aggregate results of a batch.
#[derive(Debug, Default)]
pub struct BatchStats {
    pub attempted: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub failed_episodes: Vec<u32>,
    pub downloaded: Vec<PathBuf>,
    /// The batch stopped early on user request.
    pub interrupted: bool,
}

impl BatchStats {
    /// Add one episode's outcome.
    pub fn record(&mut self, outcome: &EpisodeOutcome) {
        self.attempted += 1;
        if outcome.is_success() {
            self.succeeded += 1;
            if let Some(path) = &outcome.output_path {
                self.downloaded.push(path.clone());
            }
        } else {
            self.failed += 1;
            self.failed_episodes.push(outcome.episode_number);
        }
    }

    /// Mark the batch as stopped early.
    pub fn mark_interrupted(&mut self) {
        self.interrupted = true;
    }
}
