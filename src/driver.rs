// src/driver.rs
// =============================================================================
// The crawl driver: runs one crawl session from start to finish.
//
// What happens here:
// 1. Create the output directory
// 2. Open a crawl engine session (launches the browser, for example)
// 3. Consume the engine's page results one at a time, in the order the
//    engine yields them
// 4. For each page: check it has a URL, check it is in scope, pull out its
//    markdown, map the URL to a file path, and write it unless that path was
//    already written this session
// 5. Close the session, whatever happened in step 3
//
// Pages that can't be used (no URL, out of scope, no markdown, duplicate
// path) are skipped silently; a best-effort crawl is expected to miss some.
// Engine failures end the session. Files written before the failure stay.
// =============================================================================

use crate::config::CrawlJob;
use crate::engine::{CrawlEngine, CrawlSession, MarkdownField, PageResult};
use crate::error::CrawlError;
use crate::output::{OutputTree, PathNormalizer};
use futures::StreamExt;
use serde::Serialize;
use std::path::{Path, PathBuf};

// Why a page result was not written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingUrl,
    OutOfScope,
    NoContent,
    Duplicate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SkipCounts {
    pub missing_url: usize,
    pub out_of_scope: usize,
    pub no_content: usize,
    pub duplicate: usize,
}

impl SkipCounts {
    fn record(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::MissingUrl => self.missing_url += 1,
            SkipReason::OutOfScope => self.out_of_scope += 1,
            SkipReason::NoContent => self.no_content += 1,
            SkipReason::Duplicate => self.duplicate += 1,
        }
    }
}

// What one crawl session produced.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    pub output_root: PathBuf,
    /// Relative paths of written files, in write order
    pub written: Vec<String>,
    pub skipped: SkipCounts,
}

impl CrawlReport {
    pub fn files_written(&self) -> usize {
        self.written.len()
    }
}

#[derive(Debug, PartialEq)]
enum PageOutcome {
    Written(PathBuf),
    Skipped(SkipReason),
}

// Pulls the markdown text out of a page result.
//
// - no markdown field: None
// - plain string: returned as-is
// - generated output: `raw` if it is non-empty, otherwise `alternate`
pub fn extract_markdown(result: &PageResult) -> Option<&str> {
    match result.markdown.as_ref()? {
        MarkdownField::Plain(text) => Some(text.as_str()),
        MarkdownField::Generated(output) => match output.raw.as_deref() {
            Some(raw) if !raw.is_empty() => Some(raw),
            _ => output.alternate.as_deref(),
        },
    }
}

// Runs one crawl session, calling `on_write` with the full path of every
// file written.
pub async fn run_crawl<E, F>(engine: &E, job: &CrawlJob, mut on_write: F) -> Result<CrawlReport, CrawlError>
where
    E: CrawlEngine,
    F: FnMut(&Path),
{
    let mut tree = OutputTree::create(&job.output_root)?;
    let normalizer = PathNormalizer::new(job.docs_path_prefix());
    let mut skipped = SkipCounts::default();

    tracing::info!(seed = %job.seed, output = %job.output_root.display(), "starting crawl session");
    let mut session = engine.open().await?;

    let outcome = consume(
        &mut session,
        job,
        &normalizer,
        &mut tree,
        &mut skipped,
        &mut on_write,
    )
    .await;

    // Close on every path; a close failure never hides the crawl's own result
    if let Err(e) = session.close().await {
        tracing::warn!(error = %e, "failed to close crawl engine session");
    }
    outcome?;

    tracing::info!(files = tree.len(), ?skipped, "crawl session finished");

    Ok(CrawlReport {
        output_root: tree.root().to_path_buf(),
        written: tree.into_written(),
        skipped,
    })
}

async fn consume<S, F>(
    session: &mut S,
    job: &CrawlJob,
    normalizer: &PathNormalizer,
    tree: &mut OutputTree,
    skipped: &mut SkipCounts,
    on_write: &mut F,
) -> Result<(), CrawlError>
where
    S: CrawlSession,
    F: FnMut(&Path),
{
    let mut results = session.run(&job.seed, &job.config);

    while let Some(result) = results.next().await {
        let page = result?;

        match process_page(&page, &job.base_prefix, normalizer, tree)? {
            PageOutcome::Written(path) => on_write(&path),
            PageOutcome::Skipped(reason) => {
                tracing::debug!(url = ?page.url, ?reason, "skipping page");
                skipped.record(reason);
            }
        }
    }

    Ok(())
}

fn process_page(
    page: &PageResult,
    base_prefix: &str,
    normalizer: &PathNormalizer,
    tree: &mut OutputTree,
) -> Result<PageOutcome, CrawlError> {
    let Some(url) = page.url.as_deref().filter(|u| !u.is_empty()) else {
        return Ok(PageOutcome::Skipped(SkipReason::MissingUrl));
    };

    // The engine already filters links; this is a second check on the
    // pages it actually returns
    if !url.starts_with(base_prefix) {
        return Ok(PageOutcome::Skipped(SkipReason::OutOfScope));
    }

    let Some(markdown) = extract_markdown(page).filter(|md| !md.is_empty()) else {
        if !page.success {
            tracing::debug!(
                url,
                depth = page.depth,
                status = ?page.status_code,
                error = ?page.error_message,
                "page failed to load"
            );
        }
        return Ok(PageOutcome::Skipped(SkipReason::NoContent));
    };

    let relative = normalizer.normalize(url);

    match tree.write_once(&relative, markdown)? {
        Some(path) => Ok(PageOutcome::Written(path)),
        None => Ok(PageOutcome::Skipped(SkipReason::Duplicate)),
    }
}
