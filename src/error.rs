// src/error.rs
// =============================================================================
// Error types for the crawl engines and the crawl driver.
//
// EngineError is what a crawl engine reports. Some engine errors only affect
// one page (a 404, a navigation timeout) and are turned into failed page
// results; the rest are fatal and end the crawl.
//
// CrawlError is what the driver reports to main. A missing browser gets its
// own variant carrying install instructions, because that is the one failure
// a user can fix without touching the code.
// =============================================================================

use std::path::PathBuf;
use thiserror::Error;

/// Shown when no Chrome/Chromium executable could be started.
pub const BROWSER_INSTALL_HINT: &str = "Chrome/Chromium is not installed or could not be found. \
     Install Google Chrome or Chromium, or point CHROMIUM_PATH (--chrome-path) at the executable, \
     and retry. Use --engine http to crawl without a browser.";

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("browser executable not available: {detail}")]
    BrowserMissing { detail: String },

    #[error("failed to start crawl engine: {0}")]
    Launch(String),

    #[error("browser session failed: {0}")]
    Browser(String),

    #[error("failed to load {url}: {message}")]
    Navigation { url: String, message: String },

    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("invalid URL pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

impl EngineError {
    // Fatal errors end the result stream; the others only fail one page.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            EngineError::BrowserMissing { .. }
                | EngineError::Launch(_)
                | EngineError::Browser(_)
                | EngineError::InvalidPattern { .. }
        )
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            EngineError::Status { status, .. } => Some(*status),
            EngineError::Http { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("{hint}")]
    MissingBrowserDependency {
        hint: String,
        #[source]
        source: EngineError,
    },

    #[error(transparent)]
    Engine(EngineError),

    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<EngineError> for CrawlError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::BrowserMissing { .. } => CrawlError::MissingBrowserDependency {
                hint: BROWSER_INSTALL_HINT.to_string(),
                source: err,
            },
            other => CrawlError::Engine(other),
        }
    }
}
