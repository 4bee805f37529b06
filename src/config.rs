// src/config.rs
// =============================================================================
// Crawl settings.
//
// The tool is built to mirror one documentation site, so every setting has a
// fixed default below. The CLI (src/cli.rs) exposes each of them as an
// optional flag whose default is the constant, which means running the binary
// with no flags always does the same crawl.
//
// Two structs come out of this module:
// - CrawlConfig: the traversal bounds and filters handed to a crawl engine
// - CrawlJob: one crawl session (seed URL, scope prefix, output directory)
// =============================================================================

use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// First page of the crawl.
pub const BASE_URL: &str = "https://tanstack.com/start/latest/docs/framework/react/overview";

/// Only pages whose URL starts with this prefix are written to disk.
pub const BASE_PREFIX: &str = "https://tanstack.com/start/latest/docs";

/// Root of the markdown tree, relative to the working directory.
pub const OUTPUT_DIR: &str = "docs/tanstack/start";

pub const MAX_DEPTH: usize = 6;
pub const MAX_PAGES: usize = 200;

/// Links are only followed on this domain (and its subdomains).
pub const ALLOWED_DOMAIN: &str = "tanstack.com";

/// Links are only followed when the full URL matches this glob.
pub const URL_PATTERN: &str = "*start/latest/docs*";

/// Pause between two page fetches, in milliseconds.
pub const REQUEST_DELAY_MS: u64 = 100;

// Which view of a page the markdown is rendered from.
//
// CleanedHtml drops navigation, scripts, forms and other page chrome before
// conversion. RawHtml converts nearly the whole document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentSource {
    #[default]
    CleanedHtml,
    RawHtml,
}

// Options handed to the crawl engine verbatim.
// The driver never looks at these itself.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Maximum number of link hops from the seed (seed = depth 0)
    pub max_depth: usize,
    /// Upper bound on pages fetched in one session
    pub max_pages: usize,
    /// Domains whose links may be followed; empty allows every domain
    pub allowed_domains: Vec<String>,
    /// Glob patterns a link must match to be followed; empty allows all
    pub url_patterns: Vec<String>,
    /// Follow links that leave the seed's host
    pub include_external: bool,
    pub content_source: ContentSource,
    pub request_delay: Duration,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_depth: MAX_DEPTH,
            max_pages: MAX_PAGES,
            allowed_domains: vec![ALLOWED_DOMAIN.to_string()],
            url_patterns: vec![URL_PATTERN.to_string()],
            include_external: false,
            content_source: ContentSource::CleanedHtml,
            request_delay: Duration::from_millis(REQUEST_DELAY_MS),
        }
    }
}

// Everything one crawl session needs.
#[derive(Debug, Clone)]
pub struct CrawlJob {
    pub seed: Url,
    /// Absolute URL prefix that marks a page as in scope
    pub base_prefix: String,
    pub output_root: PathBuf,
    pub config: CrawlConfig,
}

impl CrawlJob {
    // Builds a job, validating the seed and the scope prefix as URLs.
    pub fn new(
        seed: &str,
        base_prefix: &str,
        output_root: impl Into<PathBuf>,
        config: CrawlConfig,
    ) -> Result<Self, url::ParseError> {
        let seed = Url::parse(seed)?;
        // Parsed only to reject garbage; the prefix is compared as text
        Url::parse(base_prefix)?;

        Ok(Self {
            seed,
            base_prefix: base_prefix.to_string(),
            output_root: output_root.into(),
            config,
        })
    }

    // The path part of the scope prefix, e.g. "/start/latest/docs".
    // This is what the path normalizer strips from every page URL.
    pub fn docs_path_prefix(&self) -> String {
        match Url::parse(&self.base_prefix) {
            Ok(url) => url.path().trim_end_matches('/').to_string(),
            Err(_) => String::new(),
        }
    }
}
