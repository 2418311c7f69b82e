//! Manifest capture from intercepted network requests.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::time::{sleep, Instant};

/// Records manifest URLs seen by a browsing session.
///
/// Cloning is cheap and every clone shares the same capture buffer, so the
/// request interceptor can append while the processor waits. The buffer is
/// append-only during a navigation and the last entry is authoritative:
/// players often fetch a preflight or advert manifest before the real one.
///
/// The buffer is never cleared implicitly. Call [`ManifestObserver::clear`]
/// before each navigation or manifests from the previous episode leak into
/// the next one.
#[derive(Debug, Clone)]
pub struct ManifestObserver {
    buffer: Arc<Mutex<Vec<String>>>,
    marker: String,
    poll_interval: Duration,
}

impl ManifestObserver {
    /// Create an observer matching URLs that contain `marker`, case-insensitively.
    pub fn new(marker: &str, poll_interval: Duration) -> Self {
        Self {
            buffer: Arc::new(Mutex::new(Vec::new())),
            marker: marker.to_lowercase(),
            poll_interval,
        }
    }

    /// Whether a request URL looks like a manifest.
    pub fn is_manifest(&self, url: &str) -> bool {
        url.to_lowercase().contains(&self.marker)
    }

    /// Inspect an outgoing request URL and capture it if it is a manifest.
    pub fn record(&self, url: &str) -> bool {
        if !self.is_manifest(url) {
            return false;
        }

        tracing::info!("Captured manifest request: {}", url);
        self.lock().push(url.to_string());
        true
    }

    /// Drop every captured URL.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Most recently captured URL.
    pub fn latest(&self) -> Option<String> {
        self.lock().last().cloned()
    }

    /// All captured URLs in capture order.
    pub fn captured(&self) -> Vec<String> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Wait until a manifest has been captured or `timeout` elapses.
    ///
    /// Polls at the configured cadence with an async sleep, so the browser
    /// event loop and the interceptor keep running meanwhile. Returns the most
    /// recent URL, or `None` once the budget is spent.
    pub async fn wait_for_manifest(&self, timeout: Duration) -> Option<String> {
        tracing::info!("Waiting for manifest (up to {}s)...", timeout.as_secs());
        let deadline = Instant::now() + timeout;

        loop {
            if let Some(url) = self.latest() {
                tracing::info!("Using manifest: {}", url);
                return Some(url);
            }

            let now = Instant::now();
            if now >= deadline {
                tracing::warn!("Timed out waiting for manifest");
                return None;
            }

            sleep(self.poll_interval.min(deadline - now)).await;
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        // A poisoned buffer still holds valid URLs.
        self.buffer.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observer() -> ManifestObserver {
        ManifestObserver::new(".m3u8", Duration::from_millis(20))
    }

    #[test]
    fn test_record_filters_by_marker() {
        let observer = observer();
        assert!(!observer.record("https://cdn.example.com/player.js"));
        assert!(observer.record("https://cdn.example.com/index.m3u8"));
        assert!(observer.record("https://cdn.example.com/INDEX.M3U8?token=abc"));
        assert_eq!(observer.len(), 2);
    }

    #[test]
    fn test_clones_share_buffer() {
        let observer = observer();
        let interceptor = observer.clone();
        interceptor.record("https://cdn.example.com/a.m3u8");
        assert_eq!(observer.latest().as_deref(), Some("https://cdn.example.com/a.m3u8"));

        observer.clear();
        assert!(interceptor.is_empty());
    }

    #[tokio::test]
    async fn test_wait_returns_last_captured() {
        let observer = observer();
        observer.record("https://cdn.example.com/preroll.m3u8");
        observer.record("https://cdn.example.com/ad.m3u8");
        observer.record("https://cdn.example.com/main.m3u8");

        let url = observer.wait_for_manifest(Duration::from_secs(1)).await;
        assert_eq!(url.as_deref(), Some("https://cdn.example.com/main.m3u8"));
        assert_eq!(observer.captured().len(), 3);
    }

    #[tokio::test]
    async fn test_wait_times_out_with_none() {
        let observer = observer();
        let budget = Duration::from_millis(150);

        let start = std::time::Instant::now();
        let url = observer.wait_for_manifest(budget).await;
        let elapsed = start.elapsed();

        assert_eq!(url, None);
        assert!(elapsed >= budget);
        assert!(elapsed < budget + Duration::from_millis(500), "{:?}", elapsed);
    }

    #[tokio::test]
    async fn test_wait_sees_concurrent_capture() {
        let observer = observer();
        let interceptor = observer.clone();

        tokio::spawn(async move {
            sleep(Duration::from_millis(60)).await;
            interceptor.record("https://cdn.example.com/late.m3u8");
        });

        let url = observer.wait_for_manifest(Duration::from_secs(2)).await;
        assert_eq!(url.as_deref(), Some("https://cdn.example.com/late.m3u8"));
    }

    #[tokio::test]
    async fn test_cleared_buffer_does_not_leak() {
        let observer = observer();
        observer.record("https://cdn.example.com/episode1.m3u8");
        observer.clear();

        let url = observer.wait_for_manifest(Duration::from_millis(50)).await;
        assert_eq!(url, None);
    }
}
