//! Per-episode processing requests.

/// One episode to process. Built by the batch runner for each iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeRequest {
    /// Template player URL the episode URL is derived from.
    pub template_url: String,

    /// Episode number (1-based).
    pub episode_number: u32,

    /// Number of episodes in the batch, for progress display.
    pub total_in_batch: u32,

    /// Custom series name overriding the page title.
    pub custom_name: Option<String>,
}

impl EpisodeRequest {
    pub fn new(
        template_url: impl Into<String>,
        episode_number: u32,
        total_in_batch: u32,
        custom_name: Option<String>,
    ) -> Self {
        Self {
            template_url: template_url.into(),
            episode_number,
            total_in_batch,
            custom_name: custom_name.filter(|name| !name.trim().is_empty()),
        }
    }
}
