// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging (diagnostics go to stderr)
// 3. Run one crawl session with the chosen engine
// 4. Print the summary (or a JSON report)
// 5. Exit with proper code (0 = success, 2 = error)
// =============================================================================

// Module declarations - tells Rust about our other source files
mod cli; // src/cli.rs - command-line parsing
mod config; // src/config.rs - fixed crawl settings
mod driver; // src/driver.rs - runs a crawl session
mod engine; // src/engine/ - crawl engines (browser, http)
mod error; // src/error.rs - error types
mod output; // src/output/ - URL to file path mapping, write-once output

use anyhow::Result;
use clap::Parser;
use cli::{Cli, EngineKind};
use config::CrawlJob;
use driver::CrawlReport;
use engine::{BrowserEngine, CrawlEngine, HttpEngine};
use std::path::Path;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            // {:#} prints the whole cause chain on one line
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let job = cli.crawl_job()?;

    if !cli.json {
        println!("🔍 Crawling: {}", job.seed);
        println!("📊 Max depth: {}, max pages: {}", job.config.max_depth, job.config.max_pages);
    }

    let report = match cli.engine {
        EngineKind::Browser => crawl(&BrowserEngine::new(cli.chrome_path.clone()), &job, cli.json).await?,
        EngineKind::Http => crawl(&HttpEngine::new()?, &job, cli.json).await?,
    };

    print_report(&report, cli.json)?;
    Ok(0)
}

async fn crawl<E: CrawlEngine>(engine: &E, job: &CrawlJob, json: bool) -> Result<CrawlReport> {
    // With --json, stdout is reserved for the report
    let report = driver::run_crawl(engine, job, |path: &Path| {
        if json {
            eprintln!("  -> {}", path.display());
        } else {
            println!("  -> {}", path.display());
        }
    })
    .await?;

    Ok(report)
}

fn print_report(report: &CrawlReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        println!(
            "\nWrote {} markdown files to {}.",
            report.files_written(),
            report.output_root.display()
        );
    }
    Ok(())
}

// RUST_LOG wins when set; otherwise -v/-vv pick the level
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
