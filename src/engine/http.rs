// src/engine/http.rs
// =============================================================================
// Crawl engine that fetches pages with plain HTTP GET requests.
//
// No JavaScript runs, so pages that render their content client-side come
// back mostly empty. In exchange it needs nothing installed besides this
// binary, which makes it the fallback when no browser is available.
//
// Failure handling:
// - Non-2xx responses fail only that page (status code is kept)
// - Transport errors (DNS, TLS, timeouts) fail only that page
// =============================================================================

use super::traversal::{traverse, FetchedPage, PageFetcher};
use super::{CrawlEngine, CrawlSession, PageResult};
use crate::config::CrawlConfig;
use crate::error::EngineError;
use futures::stream::BoxStream;
use reqwest::Client;
use std::time::Duration;
use url::Url;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

pub struct HttpEngine {
    client: Client,
}

impl HttpEngine {
    pub fn new() -> Result<Self, EngineError> {
        // One client for the whole crawl (connection pooling)
        let client = Client::builder()
            .timeout(Duration::from_secs(10)) // 10 second timeout per request
            .redirect(reqwest::redirect::Policy::limited(5)) // Follow up to 5 redirects
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| EngineError::Launch(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }
}

impl CrawlEngine for HttpEngine {
    type Session = HttpSession;

    async fn open(&self) -> Result<HttpSession, EngineError> {
        Ok(HttpSession {
            client: self.client.clone(),
        })
    }
}

pub struct HttpSession {
    client: Client,
}

impl CrawlSession for HttpSession {
    fn run<'a>(
        &'a mut self,
        seed: &'a Url,
        config: &'a CrawlConfig,
    ) -> BoxStream<'a, Result<PageResult, EngineError>> {
        traverse(&*self, seed, config)
    }

    async fn close(self) -> Result<(), EngineError> {
        // Nothing to release; dropping the client closes its connections
        Ok(())
    }
}

impl PageFetcher for HttpSession {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, EngineError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| EngineError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(EngineError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let html = response.text().await.map_err(|source| EngineError::Http {
            url: url.to_string(),
            source,
        })?;

        Ok(FetchedPage {
            html,
            status_code: Some(status.as_u16()),
            content_type,
            final_url,
        })
    }
}
