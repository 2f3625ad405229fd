//! Headless-browser rendering for script-built pages
//!
//! The renderer is optional: when the browser cannot be launched the crawl
//! runs with plain HTTP only.

use crate::config::{RenderConfig, WaitUntil};
use crate::crawler::fetcher::FetchError;
use crate::crawler::parser::decode_cf_emails;
use async_trait::async_trait;
use chromiumoxide::error::CdpError;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Extra settle time after navigation when waiting for network idle
const NETWORK_IDLE_SETTLE: Duration = Duration::from_millis(500);

/// Interval between `document.readyState` checks
const DOM_READY_POLL: Duration = Duration::from_millis(50);

/// Something that can return the serialized DOM of a page after scripts ran
///
/// Implementations are used from a single crawl loop, one render at a time.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Navigates to `url` and returns the rendered HTML
    async fn render(&self, url: &str) -> Result<String, FetchError>;

    /// Releases the underlying engine; called once when the crawl ends
    async fn shutdown(&mut self) {}
}

/// Chromium driven over the DevTools protocol, with one shared tab
pub struct ChromiumRenderer {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    wait_until: WaitUntil,
    timeout: Duration,
}

impl ChromiumRenderer {
    /// Launches a headless Chromium and opens a blank tab
    pub async fn launch(config: &RenderConfig, user_agent: &str) -> Result<Self, FetchError> {
        let timeout = Duration::from_millis(config.timeout_ms);

        let browser_config = BrowserConfig::builder()
            .request_timeout(timeout)
            .arg(format!("--user-agent={}", user_agent))
            .arg("--no-sandbox")
            .arg("--disable-gpu")
            .arg("--disable-extensions")
            .arg("--mute-audio")
            .build()
            .map_err(FetchError::Render)?;

        let (mut browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| FetchError::Render(format!("launch failed: {}", e)))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("Browser handler error: {:?}", e);
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                let _ = browser.close().await;
                let _ = browser.wait().await;
                handler.abort();
                return Err(FetchError::Render(format!("could not open tab: {}", e)));
            }
        };

        Ok(Self {
            browser,
            page,
            handler,
            wait_until: config.wait_until,
            timeout,
        })
    }
}

impl ChromiumRenderer {
    /// Polls `document.readyState` until the DOM is parsed
    ///
    /// Subresources may still be loading when this returns.
    async fn wait_for_dom_ready(&self) -> Result<(), CdpError> {
        loop {
            let state: String = self.page.evaluate("document.readyState").await?.into_value()?;
            if is_dom_ready(&state) {
                return Ok(());
            }
            tokio::time::sleep(DOM_READY_POLL).await;
        }
    }
}

/// `interactive` means the document is parsed; `complete` means fully loaded
fn is_dom_ready(ready_state: &str) -> bool {
    matches!(ready_state, "interactive" | "complete")
}

#[async_trait]
impl PageRenderer for ChromiumRenderer {
    async fn render(&self, url: &str) -> Result<String, FetchError> {
        let navigation = async {
            self.page.goto(url).await?;
            match self.wait_until {
                WaitUntil::DomContentLoaded => self.wait_for_dom_ready().await?,
                WaitUntil::Load => {
                    self.page.wait_for_navigation().await?;
                }
                WaitUntil::NetworkIdle => {
                    self.page.wait_for_navigation().await?;
                    tokio::time::sleep(NETWORK_IDLE_SETTLE).await;
                }
            }
            self.page.content().await
        };

        match tokio::time::timeout(self.timeout, navigation).await {
            Ok(Ok(html)) if html.trim().is_empty() => Err(FetchError::EmptyBody),
            Ok(Ok(html)) => Ok(decode_cf_emails(&html)),
            Ok(Err(e)) => Err(FetchError::Render(e.to_string())),
            Err(_) => Err(FetchError::Timeout),
        }
    }

    async fn shutdown(&mut self) {
        if let Err(e) = self.browser.close().await {
            tracing::warn!("Failed to close browser: {}", e);
        }
        if let Err(e) = self.browser.wait().await {
            tracing::warn!("Failed to wait for browser exit: {}", e);
        }
        self.handler.abort();
    }
}

/// Starts the renderer when the mode needs one
///
/// Launch failures are logged and yield `None`; they never stop a crawl.
pub async fn launch_renderer(
    config: &RenderConfig,
    user_agent: &str,
) -> Option<Box<dyn PageRenderer>> {
    if !config.mode.needs_renderer() {
        return None;
    }

    match ChromiumRenderer::launch(config, user_agent).await {
        Ok(renderer) => {
            tracing::info!("Headless browser ready (wait: {:?})", config.wait_until);
            Some(Box::new(renderer))
        }
        Err(e) => {
            tracing::warn!("Rendering unavailable, continuing with plain HTTP: {}", e);
            None
        }
    }
}
