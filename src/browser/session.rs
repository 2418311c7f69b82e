//! Browsing session capability.

use async_trait::async_trait;

use crate::browser::observer::ManifestObserver;
use crate::error::Result;

/// One browsing session, reused for every episode of a batch.
///
/// Interactions are forgiving: only `navigate` and `close` report errors,
/// and callers are expected to log them and carry on with degraded
/// information rather than abort the episode.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Load `url`, wait for it to settle, then give the player time to start.
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Click the first play control that exists and responds.
    ///
    /// Returns the selector that was clicked, or `None` when no control
    /// could be triggered. That is not an error: many players autoplay.
    async fn attempt_playback(&self) -> Option<String>;

    /// Current page title, or an empty string when it cannot be read.
    async fn read_title(&self) -> String;

    /// Manifest observer fed by this session's network traffic.
    fn observer(&self) -> &ManifestObserver;

    /// Tear down the session. Safe to call more than once.
    async fn close(&mut self) -> Result<()>;
}
