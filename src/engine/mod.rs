// src/engine/mod.rs
// =============================================================================
// Crawl engines.
//
// A crawl engine visits pages breadth-first from a seed URL and turns each
// page into markdown. The driver (src/driver.rs) only sees the two traits
// below, so it works the same with any engine:
//
// - CrawlEngine: something that can open a session (e.g. launch a browser)
// - CrawlSession: an open session that yields page results as a lazy stream,
//   and that must be closed when the crawl is over
//
// Submodules:
// - traversal: the breadth-first walk shared by every engine
// - filter: which discovered links may be followed
// - markdown: HTML to markdown conversion
// - http: engine that fetches pages with plain HTTP requests
// - browser: engine that renders pages in headless Chrome/Chromium
// =============================================================================

mod browser;
mod filter;
mod http;
mod markdown;
mod traversal;

use crate::config::CrawlConfig;
use crate::error::EngineError;
use futures::stream::BoxStream;
use std::future::Future;
use url::Url;

pub use browser::BrowserEngine;
pub use http::HttpEngine;

// The markdown attached to a page result.
//
// Engines either hand over a finished string, or a generated pair where
// `raw` is the preferred rendering and `alternate` is a fallback rendering.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkdownField {
    Plain(String),
    Generated(MarkdownOutput),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkdownOutput {
    pub raw: Option<String>,
    pub alternate: Option<String>,
}

// One visited page.
//
// Pages that failed to load are still reported (success = false, no
// markdown) so the consumer sees every URL the engine tried.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageResult {
    pub url: Option<String>,
    pub depth: usize,
    pub success: bool,
    pub status_code: Option<u16>,
    pub error_message: Option<String>,
    pub markdown: Option<MarkdownField>,
}

pub trait CrawlEngine {
    type Session: CrawlSession;

    /// Acquires the engine's resources (browser process, HTTP client, ...).
    fn open(&self) -> impl Future<Output = Result<Self::Session, EngineError>> + Send;
}

pub trait CrawlSession {
    /// Crawls from `seed`, yielding one result per visited page.
    ///
    /// The stream is lazy and finite, and it cannot be restarted. An `Err`
    /// item is fatal and is always the last item.
    fn run<'a>(
        &'a mut self,
        seed: &'a Url,
        config: &'a CrawlConfig,
    ) -> BoxStream<'a, Result<PageResult, EngineError>>;

    /// Releases the session's resources.
    fn close(self) -> impl Future<Output = Result<(), EngineError>> + Send;
}
