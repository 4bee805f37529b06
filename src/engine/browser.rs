// src/engine/browser.rs
// =============================================================================
// Crawl engine that renders pages in headless Chrome/Chromium.
//
// We drive the browser over the DevTools protocol with `chromiumoxide`:
// - open() launches the browser and spawns the task that pumps CDP events
// - one tab is reused for every page (goto, wait for load, read the DOM)
// - close() shuts the browser down and waits for the process to exit
//
// If a session is dropped without close() (the crawl was cancelled, or an
// error unwound past it), Drop stops the event task and chromiumoxide kills
// the browser process when the Browser value goes away.
//
// A missing browser is detected from chromiumoxide's errors, not from
// message text:
// - BrowserConfig::build() fails only when no executable can be detected
// - launching a configured path that does not exist fails with
//   io::ErrorKind::NotFound
// =============================================================================

use super::traversal::{traverse, FetchedPage, PageFetcher};
use super::{CrawlEngine, CrawlSession, PageResult};
use crate::config::CrawlConfig;
use crate::error::EngineError;
use chromiumoxide::error::CdpError;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::stream::BoxStream;
use futures::StreamExt;
use std::error::Error as StdError;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinHandle;
use url::Url;

pub struct BrowserEngine {
    executable: Option<PathBuf>,
    request_timeout: Duration,
}

impl BrowserEngine {
    // `executable` overrides auto-detection of the Chrome/Chromium binary.
    pub fn new(executable: Option<PathBuf>) -> Self {
        Self {
            executable,
            request_timeout: Duration::from_secs(30),
        }
    }

    fn browser_config(&self) -> Result<BrowserConfig, EngineError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .request_timeout(self.request_timeout)
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage");

        if let Some(path) = &self.executable {
            builder = builder.chrome_executable(path);
        }

        builder
            .build()
            .map_err(|detail| EngineError::BrowserMissing { detail })
    }
}

impl CrawlEngine for BrowserEngine {
    type Session = BrowserSession;

    async fn open(&self) -> Result<BrowserSession, EngineError> {
        let config = self.browser_config()?;

        tracing::info!("launching headless browser");
        let (browser, mut handler) = Browser::launch(config).await.map_err(classify_launch_error)?;

        // The handler stream must be polled for the browser to make progress
        let events = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!(error = %e, "browser event error");
                }
            }
            tracing::debug!("browser event loop finished");
        });

        let mut session = BrowserSession {
            browser,
            events,
            tab: None,
        };

        // If this fails, dropping `session` tears the browser down
        let tab = session
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| EngineError::Browser(e.to_string()))?;
        session.tab = Some(tab);

        Ok(session)
    }
}

pub struct BrowserSession {
    browser: Browser,
    events: JoinHandle<()>,
    tab: Option<Page>,
}

impl CrawlSession for BrowserSession {
    fn run<'a>(
        &'a mut self,
        seed: &'a Url,
        config: &'a CrawlConfig,
    ) -> BoxStream<'a, Result<PageResult, EngineError>> {
        traverse(&*self, seed, config)
    }

    async fn close(mut self) -> Result<(), EngineError> {
        if let Some(tab) = self.tab.take() {
            if let Err(e) = tab.close().await {
                tracing::debug!(error = %e, "failed to close tab");
            }
        }

        let closed = self
            .browser
            .close()
            .await
            .map(|_| ())
            .map_err(|e| EngineError::Browser(format!("failed to close browser: {e}")));

        // Wait for the process to exit so it is not reported as leaked
        if let Err(e) = self.browser.wait().await {
            tracing::warn!(error = %e, "failed to wait for browser exit");
        }

        closed
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.events.abort();
    }
}

impl PageFetcher for BrowserSession {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, EngineError> {
        let Some(tab) = &self.tab else {
            return Err(EngineError::Browser("no open tab".to_string()));
        };

        tab.goto(url.as_str())
            .await
            .map_err(|e| classify_page_error(url, e))?;
        tab.wait_for_navigation()
            .await
            .map_err(|e| classify_page_error(url, e))?;

        let html = tab.content().await.map_err(|e| classify_page_error(url, e))?;

        let final_url = match tab.url().await {
            Ok(Some(current)) => Url::parse(&current).unwrap_or_else(|_| url.clone()),
            _ => url.clone(),
        };

        Ok(FetchedPage {
            html,
            // CDP navigation does not hand back the HTTP status
            status_code: None,
            // content() always returns the serialized DOM
            content_type: None,
            final_url,
        })
    }
}

fn classify_launch_error(err: CdpError) -> EngineError {
    if is_not_found(&err) {
        EngineError::BrowserMissing {
            detail: err.to_string(),
        }
    } else {
        EngineError::Launch(err.to_string())
    }
}

// True when the error, or anything in its source chain, is an
// io::ErrorKind::NotFound (spawning a binary that does not exist).
fn is_not_found(err: &CdpError) -> bool {
    if let CdpError::Io(io_err) = err {
        if io_err.kind() == io::ErrorKind::NotFound {
            return true;
        }
    }

    let mut source: Option<&(dyn StdError + 'static)> = err.source();
    while let Some(current) = source {
        if let Some(io_err) = current.downcast_ref::<io::Error>() {
            if io_err.kind() == io::ErrorKind::NotFound {
                return true;
            }
        }
        source = current.source();
    }
    false
}

// Losing the websocket or the handler channel means the browser is gone,
// which no later page can recover from. Anything else fails one page.
fn classify_page_error(url: &Url, err: CdpError) -> EngineError {
    match err {
        CdpError::Ws(_) | CdpError::ChannelSendError(_) => EngineError::Browser(err.to_string()),
        other => EngineError::Navigation {
            url: url.to_string(),
            message: other.to_string(),
        },
    }
}
