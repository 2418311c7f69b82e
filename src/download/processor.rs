//! Single-episode pipeline.

use std::path::PathBuf;
use std::time::Duration;

use crate::browser::BrowserSession;
use crate::config::Config;
use crate::download::muxer::Muxer;
use crate::download::state::{EpisodeOutcome, EpisodeState};
use crate::episode::{derive, EpisodeRequest};
use crate::fs::{get_output_path, resolve_filename};

/// Failure reason when the page never requested a manifest.
pub const NO_MANIFEST: &str = "no manifest found";

/// Settings for the episode pipeline.
#[derive(Debug, Clone)]
pub struct ProcessorSettings {
    pub manifest_timeout: Duration,
    pub extension: String,
    pub output_dir: PathBuf,
}

impl ProcessorSettings {
    pub fn from_config(config: &Config, output_dir: PathBuf) -> Self {
        Self {
            manifest_timeout: config.capture.manifest_timeout(),
            extension: config.download.extension.clone(),
            output_dir,
        }
    }
}

/// Drives one episode from URL derivation to a saved file.
///
/// The session is borrowed for the whole batch and reused; the processor
/// clears its capture buffer before every navigation.
pub struct EpisodeProcessor<'a, S: ?Sized, M: ?Sized> {
    session: &'a S,
    muxer: &'a M,
    settings: ProcessorSettings,
}

impl<'a, S, M> EpisodeProcessor<'a, S, M>
where
    S: BrowserSession + ?Sized,
    M: Muxer + ?Sized,
{
    pub fn new(session: &'a S, muxer: &'a M, settings: ProcessorSettings) -> Self {
        Self {
            session,
            muxer,
            settings,
        }
    }

    /// Process one episode. Every failure ends up in the outcome.
    pub async fn process(&self, request: &EpisodeRequest) -> EpisodeOutcome {
        let mut outcome = EpisodeOutcome::new(request.episode_number);

        tracing::info!(
            "Processing episode {} ({} in batch)",
            request.episode_number,
            request.total_in_batch
        );

        let derived = derive(&request.template_url, request.episode_number);
        tracing::info!("Template URL: {}", request.template_url);
        tracing::info!("Episode URL:  {}", derived.url);
        outcome.url = derived.url.clone();

        outcome.advance(EpisodeState::Navigating);
        let observer = self.session.observer();
        observer.clear();

        let title = match self.session.navigate(&derived.url).await {
            Ok(()) => {
                self.session.attempt_playback().await;
                self.session.read_title().await
            }
            Err(e) => {
                tracing::warn!("{}; continuing without page details", e);
                String::new()
            }
        };

        let filename = resolve_filename(
            request.custom_name.as_deref(),
            &derived.episode_label,
            &title,
            &self.settings.extension,
        );
        tracing::info!("Output file: {}", filename);
        outcome.filename = Some(filename.clone());

        outcome.advance(EpisodeState::AwaitingManifest);
        let manifest = match observer
            .wait_for_manifest(self.settings.manifest_timeout)
            .await
        {
            Some(manifest) => manifest,
            None => {
                tracing::error!("No manifest found for episode {}", request.episode_number);
                return outcome.fail(NO_MANIFEST);
            }
        };
        outcome.manifest_url = Some(manifest.clone());

        outcome.advance(EpisodeState::Resolved);
        let output_path = get_output_path(&self.settings.output_dir, &filename);

        outcome.advance(EpisodeState::Downloading);
        let download = self.muxer.download(&manifest, &output_path).await;
        outcome.output_path = Some(download.output_path.clone());

        match download.error {
            None if download.success => {
                outcome.advance(EpisodeState::Done);
                outcome
            }
            Some(error) => outcome.fail(error.to_string()),
            None => outcome.fail("download failed"),
        }
    }
}
