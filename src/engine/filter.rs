// src/engine/filter.rs
// =============================================================================
// Link filters.
//
// Every link discovered during a crawl goes through a FilterChain before it
// is queued. The chain holds:
// - DomainFilter: the link's host must be an allowed domain or a subdomain
// - UrlPatternFilter: the full URL must match one of the glob patterns
//
// Globs support '*' (any run of characters) and '?' (exactly one character)
// and are compiled to anchored regexes once, when the chain is built.
// =============================================================================

use crate::config::CrawlConfig;
use crate::error::EngineError;
use regex::Regex;
use url::Url;

pub trait LinkFilter: Send + Sync {
    fn allows(&self, url: &Url) -> bool;
}

#[derive(Debug, Clone)]
pub struct DomainFilter {
    allowed: Vec<String>,
}

impl DomainFilter {
    pub fn new(allowed: &[String]) -> Self {
        Self {
            allowed: allowed.iter().map(|d| d.trim().to_ascii_lowercase()).collect(),
        }
    }
}

impl LinkFilter for DomainFilter {
    fn allows(&self, url: &Url) -> bool {
        if self.allowed.is_empty() {
            return true;
        }

        let host = match url.host_str() {
            Some(host) => host.to_ascii_lowercase(),
            None => return false,
        };

        self.allowed
            .iter()
            .any(|domain| host == *domain || host.ends_with(&format!(".{domain}")))
    }
}

#[derive(Debug, Clone)]
pub struct UrlPatternFilter {
    patterns: Vec<Regex>,
}

impl UrlPatternFilter {
    pub fn new(globs: &[String]) -> Result<Self, EngineError> {
        let patterns = globs
            .iter()
            .map(|glob| {
                Regex::new(&glob_to_regex(glob)).map_err(|source| EngineError::InvalidPattern {
                    pattern: glob.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { patterns })
    }
}

impl LinkFilter for UrlPatternFilter {
    fn allows(&self, url: &Url) -> bool {
        self.patterns.is_empty() || self.patterns.iter().any(|re| re.is_match(url.as_str()))
    }
}

// All filters must allow a link for the chain to allow it.
#[derive(Default)]
pub struct FilterChain {
    filters: Vec<Box<dyn LinkFilter>>,
}

impl FilterChain {
    pub fn from_config(config: &CrawlConfig) -> Result<Self, EngineError> {
        Ok(Self::default()
            .with(DomainFilter::new(&config.allowed_domains))
            .with(UrlPatternFilter::new(&config.url_patterns)?))
    }

    pub fn with(mut self, filter: impl LinkFilter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    pub fn allows(&self, url: &Url) -> bool {
        self.filters.iter().all(|filter| filter.allows(url))
    }
}

fn glob_to_regex(glob: &str) -> String {
    let mut pattern = String::with_capacity(glob.len() + 8);
    pattern.push('^');
    for c in glob.chars() {
        match c {
            '*' => pattern.push_str(".*"),
            '?' => pattern.push('.'),
            other => pattern.push_str(&regex::escape(&other.to_string())),
        }
    }
    pattern.push('$');
    pattern
}
