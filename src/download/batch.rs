//! Sequential batch processing.

use std::future::Future;
use std::io;
use std::time::Duration;

use tokio::time::sleep;

use crate::browser::BrowserSession;
use crate::download::muxer::Muxer;
use crate::download::processor::EpisodeProcessor;
use crate::download::state::{BatchStats, EpisodeOutcome};
use crate::episode::EpisodeRequest;

/// Which episodes to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPlan {
    pub template_url: String,
    pub start: u32,
    pub count: u32,
    pub custom_name: Option<String>,
}

impl BatchPlan {
    /// Last episode of the batch.
    pub fn end(&self) -> u32 {
        self.start.saturating_add(self.count.saturating_sub(1))
    }

    /// One request per episode, in order.
    pub fn requests(&self) -> impl Iterator<Item = EpisodeRequest> + '_ {
        (self.start..=self.end())
            .take(self.count as usize)
            .map(move |episode| {
                EpisodeRequest::new(
                    self.template_url.clone(),
                    episode,
                    self.count,
                    self.custom_name.clone(),
                )
            })
    }
}

/// Resolve when `signal` fires. A signal that cannot be registered never
/// resolves, so the batch runs to completion instead of stopping at once.
pub async fn interrupt_on<F>(signal: F)
where
    F: Future<Output = io::Result<()>>,
{
    match signal.await {
        Ok(()) => tracing::info!("Received Ctrl+C signal"),
        Err(e) => {
            tracing::warn!(
                error = %e,
                "Could not listen for Ctrl+C; the batch cannot be interrupted"
            );
            std::future::pending::<()>().await;
        }
    }
}

/// Runs episodes one after another on a shared session.
pub struct BatchRunner<'a, S: ?Sized, M: ?Sized> {
    processor: EpisodeProcessor<'a, S, M>,
    pacing_delay: Duration,
    reporter: Option<fn(&EpisodeOutcome)>,
}

impl<'a, S, M> BatchRunner<'a, S, M>
where
    S: BrowserSession + ?Sized,
    M: Muxer + ?Sized,
{
    pub fn new(processor: EpisodeProcessor<'a, S, M>, pacing_delay: Duration) -> Self {
        Self {
            processor,
            pacing_delay,
            reporter: None,
        }
    }

    /// Call `reporter` with each finished episode.
    pub fn with_reporter(mut self, reporter: fn(&EpisodeOutcome)) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Process every episode of `plan`.
    ///
    /// A failed episode never stops the batch. When `cancel` completes, the
    /// episode in flight is abandoned and no further episodes are started.
    pub async fn run<C>(&self, plan: &BatchPlan, cancel: C) -> BatchStats
    where
        C: Future<Output = ()>,
    {
        let mut stats = BatchStats::default();
        tokio::pin!(cancel);

        let mut requests = plan.requests().enumerate().peekable();

        while let Some((index, request)) = requests.next() {
            tracing::info!(
                "Progress: {}/{} (episode {})",
                index + 1,
                plan.count,
                request.episode_number
            );

            let outcome = tokio::select! {
                biased;
                _ = &mut cancel => {
                    tracing::warn!("Interrupted during episode {}", request.episode_number);
                    stats.mark_interrupted();
                    break;
                }
                outcome = self.processor.process(&request) => outcome,
            };

            if outcome.is_success() {
                tracing::info!("Episode {} downloaded", outcome.episode_number);
            } else {
                tracing::warn!(
                    "Episode {} failed: {}",
                    outcome.episode_number,
                    outcome.error.as_deref().unwrap_or("unknown error")
                );
            }
            if let Some(report) = self.reporter {
                report(&outcome);
            }
            stats.record(&outcome);

            if requests.peek().is_some() {
                tokio::select! {
                    biased;
                    _ = &mut cancel => {
                        tracing::warn!("Interrupted; not starting further episodes");
                        stats.mark_interrupted();
                        break;
                    }
                    _ = sleep(self.pacing_delay) => {}
                }
            }
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::download::processor::testing::{FakeMuxer, FakeSession, PageScript};
    use crate::download::processor::ProcessorSettings;

    const TEMPLATE: &str = "https://example.com/play/269747-1-1.html";

    fn settings() -> ProcessorSettings {
        ProcessorSettings {
            manifest_timeout: Duration::from_millis(100),
            extension: "mp4".to_string(),
            output_dir: PathBuf::from("out"),
        }
    }

    fn plan(start: u32, count: u32, name: Option<&str>) -> BatchPlan {
        BatchPlan {
            template_url: TEMPLATE.to_string(),
            start,
            count,
            custom_name: name.map(str::to_string),
        }
    }

    fn session_with_episodes(episodes: &[u32]) -> FakeSession {
        episodes.iter().fold(FakeSession::new(), |session, n| {
            session.page(
                &format!("https://example.com/play/269747-1-{}.html", n),
                PageScript {
                    title: format!("Series 第{}集", n),
                    manifests: vec![format!("https://cdn.example.com/ep{}.m3u8", n)],
                    ..Default::default()
                },
            )
        })
    }

    #[test]
    fn test_plan_requests() {
        let plan = plan(3, 3, Some("Show"));
        let episodes: Vec<u32> = plan.requests().map(|r| r.episode_number).collect();
        assert_eq!(episodes, vec![3, 4, 5]);
        assert_eq!(plan.end(), 5);
        assert!(plan.requests().all(|r| r.total_in_batch == 3));
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_batch() {
        let session = session_with_episodes(&[1, 2, 3]);
        let muxer = FakeMuxer::failing_on("https://cdn.example.com/ep2.m3u8");
        let runner = BatchRunner::new(
            EpisodeProcessor::new(&session, &muxer, settings()),
            Duration::ZERO,
        );

        let stats = runner.run(&plan(1, 3, None), std::future::pending()).await;

        assert_eq!(stats.attempted, 3);
        assert_eq!(stats.succeeded, 2);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.failed_episodes, vec![2]);
        assert!(!stats.interrupted);

        let manifests: Vec<String> = muxer.calls().into_iter().map(|(m, _)| m).collect();
        assert_eq!(
            manifests,
            vec![
                "https://cdn.example.com/ep1.m3u8",
                "https://cdn.example.com/ep2.m3u8",
                "https://cdn.example.com/ep3.m3u8",
            ]
        );
    }

    #[tokio::test]
    async fn test_custom_name_scenario() {
        let session = session_with_episodes(&[1, 2]);
        let muxer = FakeMuxer::default();
        let runner = BatchRunner::new(
            EpisodeProcessor::new(&session, &muxer, settings()),
            Duration::ZERO,
        );

        let stats = runner
            .run(&plan(1, 2, Some("MySeries")), std::future::pending())
            .await;

        assert_eq!(stats.succeeded, 2);
        assert_eq!(
            session.visited(),
            vec![
                "https://example.com/play/269747-1-1.html",
                "https://example.com/play/269747-1-2.html",
            ]
        );
        assert_eq!(
            stats.downloaded,
            vec![
                PathBuf::from("out/MySeries_Episode1.mp4"),
                PathBuf::from("out/MySeries_Episode2.mp4"),
            ]
        );
    }

    #[tokio::test]
    async fn test_title_names_when_no_custom_name() {
        let session = session_with_episodes(&[4]);
        let muxer = FakeMuxer::default();
        let runner = BatchRunner::new(
            EpisodeProcessor::new(&session, &muxer, settings()),
            Duration::ZERO,
        );

        let stats = runner.run(&plan(4, 1, None), std::future::pending()).await;

        assert_eq!(stats.downloaded, vec![PathBuf::from("out/Series_Episode4.mp4")]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_pacing_after_last_episode() {
        let session = session_with_episodes(&[1]);
        let muxer = FakeMuxer::default();
        let runner = BatchRunner::new(
            EpisodeProcessor::new(&session, &muxer, settings()),
            Duration::from_secs(3600),
        );

        let started = tokio::time::Instant::now();
        let stats = runner.run(&plan(1, 1, None), std::future::pending()).await;

        assert_eq!(stats.succeeded, 1);
        assert!(started.elapsed() < Duration::from_secs(3600));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_pacing_when_range_ends_early() {
        // The episode range saturates at u32::MAX, so only one request exists.
        let session = FakeSession::new().page(
            &format!("https://example.com/play/269747-1-{}.html", u32::MAX),
            PageScript {
                manifests: vec!["https://cdn.example.com/last.m3u8".to_string()],
                ..Default::default()
            },
        );
        let muxer = FakeMuxer::default();
        let runner = BatchRunner::new(
            EpisodeProcessor::new(&session, &muxer, settings()),
            Duration::from_secs(3600),
        );

        let started = tokio::time::Instant::now();
        let stats = runner
            .run(&plan(u32::MAX, 3, None), std::future::pending())
            .await;

        assert_eq!(stats.attempted, 1);
        assert_eq!(stats.succeeded, 1);
        assert!(started.elapsed() < Duration::from_secs(3600));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unregistered_interrupt_never_fires() {
        let signal = interrupt_on(async { Err::<(), _>(io::Error::other("no signal support")) });
        let result = tokio::time::timeout(Duration::from_secs(60), signal).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_interrupt_fires_on_signal() {
        let signal = interrupt_on(async { Ok::<(), io::Error>(()) });
        tokio_test::assert_ok!(tokio::time::timeout(Duration::from_secs(1), signal).await);
    }

    #[tokio::test]
    async fn test_unregistered_interrupt_runs_whole_batch() {
        let session = session_with_episodes(&[1, 2]);
        let muxer = FakeMuxer::default();
        let runner = BatchRunner::new(
            EpisodeProcessor::new(&session, &muxer, settings()),
            Duration::ZERO,
        );

        let cancel = interrupt_on(async { Err::<(), _>(io::Error::other("no signal support")) });
        let stats = runner.run(&plan(1, 2, None), cancel).await;

        assert!(!stats.interrupted);
        assert_eq!(stats.succeeded, 2);
    }

    #[tokio::test]
    async fn test_cancel_before_start() {
        let session = session_with_episodes(&[1, 2]);
        let muxer = FakeMuxer::default();
        let runner = BatchRunner::new(
            EpisodeProcessor::new(&session, &muxer, settings()),
            Duration::ZERO,
        );

        let stats = runner.run(&plan(1, 2, None), std::future::ready(())).await;

        assert!(stats.interrupted);
        assert_eq!(stats.attempted, 0);
        assert!(session.visited().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_during_pacing_stops_new_episodes() {
        let session = session_with_episodes(&[1, 2, 3]);
        let muxer = FakeMuxer::default();
        let runner = BatchRunner::new(
            EpisodeProcessor::new(&session, &muxer, settings()),
            Duration::from_secs(5),
        );

        let stats = runner
            .run(&plan(1, 3, None), sleep(Duration::from_millis(200)))
            .await;

        assert!(stats.interrupted);
        assert_eq!(stats.attempted, 1);
        assert_eq!(session.visited().len(), 1);
    }
}
