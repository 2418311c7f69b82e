//! Headless Chrome session driven over the DevTools protocol.

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::fetch::{
    self, ContinueRequestParams, EventRequestPaused, FailRequestParams, RequestPattern,
};
use chromiumoxide::cdp::browser_protocol::network::{
    self, ErrorReason, LoaderId, SetCacheDisabledParams, SetUserAgentOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::page::{
    EventLifecycleEvent, NavigateParams, SetLifecycleEventsEnabledParams,
};
use chromiumoxide::error::CdpError;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::{Browser, BrowserConfig as LaunchConfig, Page};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};

use crate::browser::observer::ManifestObserver;
use crate::browser::session::BrowserSession;
use crate::config::BrowserConfig;
use crate::error::{Error, Result};

/// Flags keeping manifest requests observable: no cross-origin isolation
/// and no cache hits that would skip the network.
const LAUNCH_FLAGS: [&str; 4] = [
    "--disable-web-security",
    "--disable-features=IsolateOrigins,site-per-process",
    "--aggressive-cache-discard",
    "--disable-application-cache",
];

/// Lifecycle event fired once the page has had no network activity for 500ms.
const NETWORK_IDLE: &str = "networkIdle";

/// A Chrome instance with one page whose requests are all intercepted.
pub struct ChromeSession {
    browser: Option<Browser>,
    page: Page,
    observer: ManifestObserver,
    settings: BrowserConfig,
    handler_task: JoinHandle<()>,
    interceptor_task: JoinHandle<()>,
}

impl ChromeSession {
    /// Launch the browser, open a page and start request interception.
    pub async fn launch(settings: &BrowserConfig, observer: ManifestObserver) -> Result<Self> {
        let launch_config = build_launch_config(settings)?;

        let (browser, mut handler) = Browser::launch(launch_config).await?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("Browser handler error: {}", e);
                }
            }
        });

        let page = browser.new_page("about:blank").await?;

        page.execute(SetUserAgentOverrideParams::new(settings.user_agent.clone()))
            .await?;
        page.execute(network::EnableParams::default()).await?;
        page.execute(SetCacheDisabledParams::new(true)).await?;
        page.execute(SetLifecycleEventsEnabledParams::new(true)).await?;

        let interceptor_task = start_interception(&page, observer.clone()).await?;

        tracing::info!("Browser started");

        Ok(Self {
            browser: Some(browser),
            page,
            observer,
            settings: settings.clone(),
            handler_task,
            interceptor_task,
        })
    }

    /// Navigate and wait until the new document's network goes idle.
    async fn load(&self, url: &str) -> Result<()> {
        let params = NavigateParams::builder()
            .url(url)
            .build()
            .map_err(Error::Navigation)?;

        // Subscribe first so the idle event cannot slip past.
        let mut lifecycle = self.page.event_listener::<EventLifecycleEvent>().await?;

        let navigation = self.page.execute(params).await?.result;
        if let Some(error) = navigation.error_text {
            return Err(Error::Navigation(error));
        }

        // Same-document navigations have no loader and no lifecycle.
        let loader_id = match navigation.loader_id {
            Some(loader_id) => loader_id,
            None => return Ok(()),
        };

        while let Some(event) = lifecycle.next().await {
            if is_network_idle(&event, &loader_id) {
                tracing::debug!("Network idle: {}", url);
                return Ok(());
            }
        }

        Err(Error::Navigation("page closed while loading".to_string()))
    }
}

fn is_network_idle(event: &EventLifecycleEvent, loader_id: &LoaderId) -> bool {
    event.name == NETWORK_IDLE && &event.loader_id == loader_id
}

fn build_launch_config(settings: &BrowserConfig) -> Result<LaunchConfig> {
    let mut builder = LaunchConfig::builder()
        .window_size(settings.viewport_width, settings.viewport_height)
        .viewport(Viewport {
            width: settings.viewport_width,
            height: settings.viewport_height,
            ..Default::default()
        })
        .args(LAUNCH_FLAGS);

    if !settings.headless {
        builder = builder.with_head();
    }

    if let Some(path) = &settings.chrome_executable {
        builder = builder.chrome_executable(path);
    }

    builder.build().map_err(Error::Browser)
}

/// Pause every request through the Fetch domain, record manifests, and let
/// the request continue. A request that cannot be continued is failed so it
/// never hangs the page.
async fn start_interception(page: &Page, observer: ManifestObserver) -> Result<JoinHandle<()>> {
    let mut paused = page.event_listener::<EventRequestPaused>().await?;

    page.execute(
        fetch::EnableParams::builder()
            .pattern(RequestPattern::builder().url_pattern("*").build())
            .build(),
    )
    .await?;

    let page = page.clone();
    Ok(tokio::spawn(async move {
        while let Some(event) = paused.next().await {
            observer.record(&event.request.url);

            let page = page.clone();
            tokio::spawn(async move {
                let request_id = event.request_id.clone();
                if let Err(e) = page.execute(ContinueRequestParams::new(request_id.clone())).await {
                    tracing::debug!("Aborting request {}: {}", event.request.url, e);
                    if let Err(e) = page
                        .execute(FailRequestParams::new(request_id, ErrorReason::Aborted))
                        .await
                    {
                        tracing::debug!("Abort failed: {}", e);
                    }
                }
            });
        }
    }))
}

#[async_trait]
impl BrowserSession for ChromeSession {
    async fn navigate(&self, url: &str) -> Result<()> {
        match timeout(self.settings.navigation_timeout(), self.load(url)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(Error::Navigation(format!("{}: {}", url, e))),
            Err(_) => {
                return Err(Error::Navigation(format!(
                    "{}: page load exceeded {}s",
                    url,
                    self.settings.navigation_timeout_secs
                )))
            }
        }

        sleep(self.settings.settle_delay()).await;
        Ok(())
    }

    async fn attempt_playback(&self) -> Option<String> {
        for selector in &self.settings.play_selectors {
            let click = async {
                let element = self.page.find_element(selector.as_str()).await?;
                element.click().await?;
                Ok::<_, CdpError>(())
            };

            match timeout(self.settings.click_timeout(), click).await {
                Ok(Ok(())) => {
                    tracing::info!("Clicked play control: {}", selector);
                    sleep(self.settings.post_click_delay()).await;
                    return Some(selector.clone());
                }
                Ok(Err(e)) => tracing::debug!("Play control {} unavailable: {}", selector, e),
                Err(_) => tracing::debug!("Play control {} timed out", selector),
            }
        }

        tracing::debug!("No play control triggered");
        None
    }

    async fn read_title(&self) -> String {
        match self.page.get_title().await {
            Ok(title) => {
                let title = title.unwrap_or_default();
                tracing::info!("Page title: {}", title);
                title
            }
            Err(e) => {
                tracing::warn!("Failed to read page title: {}", e);
                String::new()
            }
        }
    }

    fn observer(&self) -> &ManifestObserver {
        &self.observer
    }

    async fn close(&mut self) -> Result<()> {
        let result = match self.browser.take() {
            Some(mut browser) => {
                let closed = browser.close().await.map(|_| ());
                if let Err(e) = browser.wait().await {
                    tracing::debug!("Waiting for browser exit failed: {}", e);
                }
                tracing::info!("Browser closed");
                closed.map_err(Error::from)
            }
            None => Ok(()),
        };

        self.interceptor_task.abort();
        self.handler_task.abort();
        result
    }
}

#[cfg(test)]
mod tests {
    use chromiumoxide::cdp::browser_protocol::network::MonotonicTime;
    use chromiumoxide::cdp::browser_protocol::page::FrameId;

    use super::*;

    fn lifecycle(name: &str, loader: &str) -> EventLifecycleEvent {
        EventLifecycleEvent {
            frame_id: FrameId::new("main"),
            loader_id: LoaderId::new(loader),
            name: name.to_string(),
            timestamp: MonotonicTime::new(0.0),
        }
    }

    #[test]
    fn test_network_idle_matches_current_document_only() {
        let current = LoaderId::new("loader-2");

        assert!(is_network_idle(&lifecycle("networkIdle", "loader-2"), &current));
        // The previous document going idle must not end the wait.
        assert!(!is_network_idle(&lifecycle("networkIdle", "loader-1"), &current));
        assert!(!is_network_idle(&lifecycle("load", "loader-2"), &current));
        assert!(!is_network_idle(&lifecycle("networkAlmostIdle", "loader-2"), &current));
    }
}
