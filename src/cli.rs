// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// The tool has one job, so there are no subcommands. Every flag is optional
// and defaults to the fixed crawl settings in src/config.rs: running
// `docs-crawler` with no arguments always performs the same crawl.
// =============================================================================

use crate::config::{self, ContentSource, CrawlConfig, CrawlJob};
use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "docs-crawler",
    version,
    about = "Crawl a documentation site and save every page as markdown",
    long_about = "docs-crawler walks a documentation site breadth-first from a seed page, \
                  converts each page to markdown and writes it to a file whose path mirrors \
                  the page URL. Each path is written at most once per run."
)]
pub struct Cli {
    /// First page of the crawl
    #[arg(long, default_value = config::BASE_URL)]
    pub seed: String,

    /// Only pages whose URL starts with this prefix are saved
    ///
    /// Its path (e.g. /start/latest/docs) is also stripped from file names.
    #[arg(long, default_value = config::BASE_PREFIX)]
    pub base_prefix: String,

    /// Directory the markdown tree is written to
    #[arg(long, short, default_value = config::OUTPUT_DIR)]
    pub output: PathBuf,

    /// Maximum number of link hops from the seed page
    #[arg(long, default_value_t = config::MAX_DEPTH)]
    pub max_depth: usize,

    /// Maximum number of pages to visit
    #[arg(long, default_value_t = config::MAX_PAGES)]
    pub max_pages: usize,

    /// Only follow links on this domain (repeatable)
    #[arg(long = "allow-domain", default_value = config::ALLOWED_DOMAIN)]
    pub allowed_domains: Vec<String>,

    /// Only follow links whose URL matches this glob (repeatable)
    #[arg(long = "pattern", default_value = config::URL_PATTERN)]
    pub url_patterns: Vec<String>,

    /// How pages are fetched
    #[arg(long, value_enum, default_value_t = EngineKind::Browser)]
    pub engine: EngineKind,

    /// Render markdown from the raw HTML instead of the cleaned page
    #[arg(long)]
    pub raw_html: bool,

    /// Path to the Chrome/Chromium executable (auto-detected when unset)
    #[arg(long, env = "CHROMIUM_PATH")]
    pub chrome_path: Option<PathBuf>,

    /// Pause between page fetches, in milliseconds
    #[arg(long, default_value_t = config::REQUEST_DELAY_MS)]
    pub delay_ms: u64,

    /// Print the crawl report as JSON instead of a summary line
    #[arg(long)]
    pub json: bool,

    /// More diagnostics on stderr (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineKind {
    /// Headless Chrome/Chromium (runs the page's JavaScript)
    Browser,
    /// Plain HTTP requests (no browser needed)
    Http,
}

impl Cli {
    pub fn crawl_config(&self) -> CrawlConfig {
        CrawlConfig {
            max_depth: self.max_depth,
            max_pages: self.max_pages,
            allowed_domains: self.allowed_domains.clone(),
            url_patterns: self.url_patterns.clone(),
            include_external: false,
            content_source: if self.raw_html {
                ContentSource::RawHtml
            } else {
                ContentSource::CleanedHtml
            },
            request_delay: Duration::from_millis(self.delay_ms),
        }
    }

    pub fn crawl_job(&self) -> Result<CrawlJob> {
        CrawlJob::new(&self.seed, &self.base_prefix, &self.output, self.crawl_config())
            .with_context(|| format!("invalid seed '{}' or base prefix '{}'", self.seed, self.base_prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_flags_uses_fixed_settings() {
        let cli = Cli::try_parse_from(["docs-crawler"]).unwrap();
        let job = cli.crawl_job().unwrap();

        assert_eq!(job.seed.as_str(), config::BASE_URL);
        assert_eq!(job.base_prefix, config::BASE_PREFIX);
        assert_eq!(job.output_root, PathBuf::from("docs/tanstack/start"));
        assert_eq!(job.config.max_depth, 6);
        assert_eq!(job.config.max_pages, 200);
        assert_eq!(job.config.allowed_domains, vec!["tanstack.com".to_string()]);
        assert_eq!(job.config.url_patterns, vec!["*start/latest/docs*".to_string()]);
        assert_eq!(job.config.content_source, ContentSource::CleanedHtml);
        assert_eq!(cli.engine, EngineKind::Browser);
        assert!(!cli.json);
    }

    #[test]
    fn test_flags_override_settings() {
        let cli = Cli::try_parse_from([
            "docs-crawler",
            "--engine",
            "http",
            "--max-depth",
            "2",
            "--raw-html",
            "--allow-domain",
            "example.com",
            "--allow-domain",
            "docs.example.org",
            "-vv",
        ])
        .unwrap();
        let config = cli.crawl_config();

        assert_eq!(cli.engine, EngineKind::Http);
        assert_eq!(cli.verbose, 2);
        assert_eq!(config.max_depth, 2);
        assert_eq!(config.content_source, ContentSource::RawHtml);
        assert_eq!(
            config.allowed_domains,
            vec!["example.com".to_string(), "docs.example.org".to_string()]
        );
    }

    #[test]
    fn test_invalid_seed_is_an_error() {
        let cli = Cli::try_parse_from(["docs-crawler", "--seed", "not a url"]).unwrap();
        assert!(cli.crawl_job().is_err());
    }
}
