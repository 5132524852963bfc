//! Rowcrawl command-line interface
//!
//! Loads a TOML job file and runs the crawl, streaming one JSON line per
//! fetched page into the job's output file.

use anyhow::Context;
use clap::Parser;
use rowcrawl::config::{load_job, CrawlJob, EngineSettings};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Rowcrawl: a concurrent SEO page-record crawler
///
/// Fetches pages from a seed list (optionally following links), extracts
/// SEO fields, structured data, and custom selector fields per page, and
/// appends each page as a JSON line to the output file.
#[derive(Parser, Debug)]
#[command(name = "rowcrawl")]
#[command(version)]
#[command(about = "A concurrent SEO page-record crawler", long_about = None)]
struct Cli {
    /// Path to TOML job file
    #[arg(value_name = "JOB")]
    job: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate the job and show what would be crawled without fetching
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let job = load_job(&cli.job)
        .with_context(|| format!("failed to load job file {}", cli.job.display()))?;

    setup_logging(cli.verbose, cli.quiet, job.log_file.as_deref())?;

    if cli.dry_run {
        handle_dry_run(&job);
        return Ok(());
    }

    let report = rowcrawl::crawl(job).await?;

    println!();
    println!("Crawl {}", report.phase);
    if let Some(reason) = report.stop_reason {
        println!("  Stop reason:      {}", reason);
    }
    println!("  Pages fetched:    {}", report.pages_fetched);
    println!("  Rows written:     {}", report.items_emitted);
    println!("  Fetch errors:     {}", report.errors);
    println!("  Links enqueued:   {}", report.links_discovered);
    if report.robots_blocked > 0 {
        println!("  Robots-blocked:   {}", report.robots_blocked);
    }
    println!("  Columns:          {}", report.columns.len());
    println!("  Elapsed:          {:.1?}", report.elapsed);

    Ok(())
}

/// Sets up the tracing subscriber, optionally mirroring to a log file
fn setup_logging(verbose: u8, quiet: bool, log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("rowcrawl=info,warn"),
            1 => EnvFilter::new("rowcrawl=debug,info"),
            2 => EnvFilter::new("rowcrawl=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let stdout_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false);

    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            let file_layer = fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Arc::new(file));
            tracing_subscriber::registry()
                .with(filter)
                .with(stdout_layer)
                .with(file_layer)
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(stdout_layer)
                .init();
        }
    }

    Ok(())
}

/// Handles --dry-run: show the validated job without fetching anything
fn handle_dry_run(job: &CrawlJob) {
    let settings = EngineSettings::resolve(&job.custom_settings);

    println!("=== Rowcrawl Dry Run ===\n");

    println!(
        "Mode: {}",
        if job.follow_links {
            "discovery (follow links)"
        } else {
            "list (seeds only)"
        }
    );
    println!("Output: {}", job.output_file.display());
    if let Some(dir) = &job.job_dir {
        println!("Job directory: {}", dir.display());
    }

    println!("\nSeeds ({}):", job.url_list.len());
    for seed in &job.url_list {
        println!("  - {}", seed);
    }

    match &job.allowed_domains {
        Some(domains) => {
            println!("\nAllowed domains ({}):", domains.len());
            for domain in domains {
                println!("  - {}", domain);
            }
        }
        None => println!("\nAllowed domains: derived from seeds"),
    }

    if let Some(limit) = job.depth_limit {
        println!("Depth limit: {}", limit);
    }

    if !job.css_selectors.is_empty() || !job.xpath_selectors.is_empty() {
        println!(
            "\nCustom selectors ({} css, {} xpath):",
            job.css_selectors.len(),
            job.xpath_selectors.len()
        );
        for (name, expr) in &job.css_selectors {
            println!("  {} = css {}", name, expr);
        }
        for (name, expr) in &job.xpath_selectors {
            println!("  {} = xpath {}", name, expr);
        }
    }

    println!("\nEngine settings:");
    println!("  User agent: {}", settings.user_agent);
    println!("  Obey robots.txt: {}", settings.robotstxt_obey);
    println!("  Concurrent requests: {}", settings.concurrent_requests);
    println!(
        "  Per-domain concurrency: {}",
        settings.concurrent_requests_per_domain
    );
    println!("  Download delay: {}s", settings.download_delay_secs);
    println!("  Download timeout: {}s", settings.download_timeout_secs);
    for (name, limit) in [
        ("Max errors", settings.closespider_errorcount),
        ("Max items", settings.closespider_itemcount),
        ("Max pages", settings.closespider_pagecount),
        ("Max seconds", settings.closespider_timeout_secs),
    ] {
        if let Some(limit) = limit {
            println!("  {}: {}", name, limit);
        }
    }

    println!("\n✓ Job is valid");
}
