// src/engine/traversal.rs
// =============================================================================
// Breadth-first traversal shared by all crawl engines.
//
// How it works:
// 1. Start with the seed URL in a queue (depth 0)
// 2. Fetch the next page through the engine's PageFetcher
// 3. Render its markdown and yield it as a PageResult
// 4. If the page is shallower than max_depth, queue its links that pass the
//    filters and have not been seen yet
// 5. Repeat until the queue is empty or max_pages pages were fetched
//
// The traversal is exposed as a lazy stream: nothing is fetched until the
// consumer asks for the next item.
//
// Politeness:
// - Waits `request_delay` between fetches
// - Only follows links on the seed's host unless include_external is set
// =============================================================================

use super::filter::FilterChain;
use super::markdown::render_page;
use super::{MarkdownField, PageResult};
use crate::config::CrawlConfig;
use crate::error::EngineError;
use futures::stream::{self, BoxStream, StreamExt};
use scraper::{Html, Selector};
use std::collections::{HashSet, VecDeque};
use std::future::Future;
use url::Url;

// What an engine has to provide: turn one URL into HTML.
pub trait PageFetcher {
    fn fetch(&self, url: &Url) -> impl Future<Output = Result<FetchedPage, EngineError>> + Send;
}

#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub html: String,
    pub status_code: Option<u16>,
    /// Media type from the response, when the engine knows it
    pub content_type: Option<String>,
    /// Where the page ended up after redirects; links resolve against this
    pub final_url: Url,
}

impl FetchedPage {
    // Markdown and plain-text documents are saved as they are
    fn is_markdown(&self) -> bool {
        self.content_type.as_deref().is_some_and(|ct| {
            let ct = ct.trim().to_ascii_lowercase();
            ct.starts_with("text/markdown") || ct.starts_with("text/plain")
        })
    }
}

// Represents a page in the crawl queue
#[derive(Debug, Clone)]
struct CrawlItem {
    url: Url,
    depth: usize,
}

struct Traversal<'a, F> {
    fetcher: &'a F,
    config: &'a CrawlConfig,
    filters: FilterChain,
    seed_host: Option<(String, Option<u16>)>,
    queue: VecDeque<CrawlItem>,
    // URLs already queued (or fetched), without fragments
    seen: HashSet<String>,
    fetched: usize,
    finished: bool,
}

// Crawls breadth-first from `seed`, yielding one result per fetched page.
pub fn traverse<'a, F>(
    fetcher: &'a F,
    seed: &'a Url,
    config: &'a CrawlConfig,
) -> BoxStream<'a, Result<PageResult, EngineError>>
where
    F: PageFetcher + Sync,
{
    let filters = match FilterChain::from_config(config) {
        Ok(filters) => filters,
        Err(e) => return stream::once(async move { Err(e) }).boxed(),
    };

    let mut seed = seed.clone();
    seed.set_fragment(None);

    let mut traversal = Traversal {
        fetcher,
        config,
        filters,
        seed_host: seed.host_str().map(|h| (h.to_string(), seed.port_or_known_default())),
        queue: VecDeque::new(),
        seen: HashSet::new(),
        fetched: 0,
        finished: false,
    };
    traversal.seen.insert(seed.to_string());
    traversal.queue.push_back(CrawlItem { url: seed, depth: 0 });

    stream::unfold(traversal, |mut traversal| async move {
        let item = traversal.next_page().await?;
        Some((item, traversal))
    })
    .boxed()
}

impl<'a, F> Traversal<'a, F>
where
    F: PageFetcher + Sync,
{
    async fn next_page(&mut self) -> Option<Result<PageResult, EngineError>> {
        if self.finished || self.fetched >= self.config.max_pages {
            return None;
        }

        let item = self.queue.pop_front()?;

        if self.fetched > 0 && !self.config.request_delay.is_zero() {
            tokio::time::sleep(self.config.request_delay).await;
        }
        self.fetched += 1;

        tracing::debug!(depth = item.depth, url = %item.url, "crawling");

        match self.fetcher.fetch(&item.url).await {
            Ok(page) => {
                let markdown = if page.is_markdown() {
                    MarkdownField::Plain(page.html)
                } else {
                    if item.depth < self.config.max_depth {
                        self.enqueue_links(&page, item.depth + 1);
                    }
                    render_page(&page.html, self.config.content_source)
                };

                Some(Ok(PageResult {
                    url: Some(item.url.to_string()),
                    depth: item.depth,
                    success: true,
                    status_code: page.status_code,
                    error_message: None,
                    markdown: Some(markdown),
                }))
            }
            Err(e) if e.is_fatal() => {
                self.finished = true;
                Some(Err(e))
            }
            Err(e) => {
                tracing::warn!(url = %item.url, error = %e, "failed to fetch page");
                Some(Ok(PageResult {
                    url: Some(item.url.to_string()),
                    depth: item.depth,
                    success: false,
                    status_code: e.status_code(),
                    error_message: Some(e.to_string()),
                    markdown: None,
                }))
            }
        }
    }

    fn enqueue_links(&mut self, page: &FetchedPage, depth: usize) {
        for link in extract_links(&page.html, &page.final_url) {
            if !self.should_follow(&link) {
                continue;
            }
            // insert() returns false for URLs we have already queued
            if self.seen.insert(link.to_string()) {
                self.queue.push_back(CrawlItem { url: link, depth });
            }
        }
    }

    fn should_follow(&self, link: &Url) -> bool {
        if !self.config.include_external {
            let host = link.host_str().map(|h| (h.to_string(), link.port_or_known_default()));
            if host != self.seed_host {
                return false;
            }
        }
        self.filters.allows(link)
    }
}

// Extracts every http(s) link on a page as an absolute URL without fragment.
//
// Html is not Send, so parsing stays inside this synchronous function and
// never lives across an await.
fn extract_links(html: &str, base: &Url) -> Vec<Url> {
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let document = Html::parse_document(html);

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(base, href))
        .collect()
}

// Resolves a link (possibly relative) to an absolute URL
fn resolve_link(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();

    // Skip anchors and special protocols
    if href.is_empty()
        || href.starts_with('#')
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("javascript:")
    {
        return None;
    }

    let mut url = base.join(href).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    url.set_fragment(None);
    Some(url)
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why stream::unfold?
//    - unfold turns "a state plus an async step function" into a Stream
//    - Each poll runs one step: fetch one page, return it with the new state
//    - The consumer controls the pace; nothing runs ahead of it
//
// 2. Why mark URLs as seen when queuing instead of when fetching?
//    - The same link usually appears on many pages (sidebars, headers)
//    - Marking early keeps every URL in the queue at most once
//
// 3. Depth counting
//    - The seed is depth 0
//    - Links found on a page at depth d are queued at depth d + 1, but only
//      while d < max_depth
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    // Serves canned HTML; unknown URLs are 404s, "fatal" URLs kill the session
    #[derive(Default)]
    struct FakeFetcher {
        pages: HashMap<String, String>,
        content_types: HashMap<String, String>,
        fatal: Vec<String>,
        requested: Mutex<Vec<String>>,
    }

    impl FakeFetcher {
        fn page(mut self, url: &str, html: &str) -> Self {
            self.pages.insert(url.to_string(), html.to_string());
            self
        }

        fn requested(&self) -> Vec<String> {
            self.requested.lock().unwrap().clone()
        }
    }

    impl PageFetcher for FakeFetcher {
        async fn fetch(&self, url: &Url) -> Result<FetchedPage, EngineError> {
            self.requested.lock().unwrap().push(url.to_string());

            if self.fatal.contains(&url.to_string()) {
                return Err(EngineError::Browser("connection to browser lost".into()));
            }

            match self.pages.get(url.as_str()) {
                Some(html) => Ok(FetchedPage {
                    html: html.clone(),
                    status_code: Some(200),
                    content_type: self.content_types.get(url.as_str()).cloned(),
                    final_url: url.clone(),
                }),
                None => Err(EngineError::Status {
                    url: url.to_string(),
                    status: 404,
                }),
            }
        }
    }

    const ROOT: &str = "https://tanstack.com/start/latest/docs/overview";
    const GUIDE: &str = "https://tanstack.com/start/latest/docs/guide";
    const DEEP: &str = "https://tanstack.com/start/latest/docs/guide/deep";

    fn config() -> CrawlConfig {
        CrawlConfig {
            request_delay: Duration::ZERO,
            ..CrawlConfig::default()
        }
    }

    fn site() -> FakeFetcher {
        FakeFetcher::default()
            .page(
                ROOT,
                r##"<h1>Overview</h1>
                <a href="/start/latest/docs/guide">Guide</a>
                <a href="/start/latest/docs/guide#setup">Guide again</a>
                <a href="/query/latest/docs/overview">Other product</a>
                <a href="https://github.com/TanStack/router">GitHub</a>
                <a href="mailto:team@tanstack.com">Mail</a>"##,
            )
            .page(
                GUIDE,
                r#"<h1>Guide</h1>
                <a href="/start/latest/docs/guide/deep">Deep</a>
                <a href="/start/latest/docs/overview">Back</a>"#,
            )
            .page(DEEP, "<h1>Deep</h1>")
    }

    async fn crawl(fetcher: &FakeFetcher, config: &CrawlConfig) -> Vec<Result<PageResult, EngineError>> {
        let seed = Url::parse(ROOT).unwrap();
        traverse(fetcher, &seed, config).collect().await
    }

    fn urls(results: &[Result<PageResult, EngineError>]) -> Vec<String> {
        results
            .iter()
            .filter_map(|r| r.as_ref().ok())
            .filter_map(|page| page.url.clone())
            .collect()
    }

    #[tokio::test]
    async fn test_visits_pages_breadth_first() {
        let fetcher = site();
        let results = crawl(&fetcher, &config()).await;

        assert_eq!(urls(&results), vec![ROOT, GUIDE, DEEP]);
        let depths: Vec<usize> = results.iter().map(|r| r.as_ref().unwrap().depth).collect();
        assert_eq!(depths, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_fragments_and_repeats_are_fetched_once() {
        let fetcher = site();
        crawl(&fetcher, &config()).await;

        let requested = fetcher.requested();
        assert_eq!(requested.iter().filter(|u| u.as_str() == GUIDE).count(), 1);
        assert_eq!(requested.iter().filter(|u| u.as_str() == ROOT).count(), 1);
    }

    #[tokio::test]
    async fn test_filtered_links_are_not_followed() {
        let fetcher = site();
        crawl(&fetcher, &config()).await;

        let requested = fetcher.requested();
        assert!(!requested.iter().any(|u| u.contains("/query/")));
        assert!(!requested.iter().any(|u| u.contains("github.com")));
    }

    #[tokio::test]
    async fn test_respects_max_depth() {
        let fetcher = site();
        let config = CrawlConfig {
            max_depth: 1,
            ..config()
        };

        let results = crawl(&fetcher, &config).await;
        assert_eq!(urls(&results), vec![ROOT, GUIDE]);
    }

    #[tokio::test]
    async fn test_depth_zero_fetches_only_the_seed() {
        let fetcher = site();
        let config = CrawlConfig {
            max_depth: 0,
            ..config()
        };

        let results = crawl(&fetcher, &config).await;
        assert_eq!(urls(&results), vec![ROOT]);
    }

    #[tokio::test]
    async fn test_respects_max_pages() {
        let fetcher = site();
        let config = CrawlConfig {
            max_pages: 2,
            ..config()
        };

        let results = crawl(&fetcher, &config).await;
        assert_eq!(results.len(), 2);
        assert_eq!(fetcher.requested().len(), 2);
    }

    #[tokio::test]
    async fn test_seed_is_fetched_even_if_filters_reject_it() {
        let fetcher = site();
        let config = CrawlConfig {
            url_patterns: vec!["*never-matches*".to_string()],
            ..config()
        };

        let results = crawl(&fetcher, &config).await;
        assert_eq!(urls(&results), vec![ROOT]);
    }

    #[tokio::test]
    async fn test_failed_page_is_yielded_without_markdown() {
        let fetcher = FakeFetcher::default().page(ROOT, r#"<a href="/start/latest/docs/missing">x</a>"#);

        let results = crawl(&fetcher, &config()).await;

        assert_eq!(results.len(), 2);
        let missing = results[1].as_ref().unwrap();
        assert!(!missing.success);
        assert_eq!(missing.status_code, Some(404));
        assert!(missing.markdown.is_none());
        assert!(missing.error_message.as_deref().unwrap().contains("404"));
    }

    #[tokio::test]
    async fn test_fatal_error_ends_the_stream() {
        let mut fetcher = site();
        fetcher.fatal.push(GUIDE.to_string());

        let results = crawl(&fetcher, &config()).await;

        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(EngineError::Browser(_))));
        assert!(!fetcher.requested().contains(&DEEP.to_string()));
    }

    #[tokio::test]
    async fn test_successful_pages_carry_markdown() {
        let fetcher = site();
        let results = crawl(&fetcher, &config()).await;

        match &results[0].as_ref().unwrap().markdown {
            Some(MarkdownField::Generated(output)) => {
                assert!(output.raw.as_deref().unwrap().contains("# Overview"));
            }
            other => panic!("unexpected markdown: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_markdown_documents_are_kept_verbatim() {
        let mut fetcher = FakeFetcher::default().page(ROOT, "# Overview\n\n[Guide](/start/latest/docs/guide)\n");
        fetcher
            .content_types
            .insert(ROOT.to_string(), "text/markdown; charset=utf-8".to_string());

        let results = crawl(&fetcher, &config()).await;

        // No HTML to scan for links, so the crawl stops at the seed
        assert_eq!(results.len(), 1);
        assert_eq!(
            results[0].as_ref().unwrap().markdown,
            Some(MarkdownField::Plain("# Overview\n\n[Guide](/start/latest/docs/guide)\n".to_string()))
        );
    }

    #[test]
    fn test_resolve_relative_link() {
        let base = Url::parse("https://example.com/docs/page").unwrap();
        let result = resolve_link(&base, "/docs/other#part");
        assert_eq!(result.map(|u| u.to_string()), Some("https://example.com/docs/other".to_string()));
    }

    #[test]
    fn test_skip_anchor_and_mailto() {
        let base = Url::parse("https://example.com/page").unwrap();
        assert_eq!(resolve_link(&base, "#section"), None);
        assert_eq!(resolve_link(&base, "mailto:test@example.com"), None);
        assert_eq!(resolve_link(&base, "javascript:void(0)"), None);
    }
}
