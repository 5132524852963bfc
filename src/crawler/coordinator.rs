//! Crawl coordination
//!
//! The coordinator owns everything with job lifetime: scheduler, output
//! sink, stats, robots cache. It seeds the frontier, fans out a bounded
//! pool of worker tasks, and turns the final counters into a report.
//!
//! Workers run the standard cycle: poll the scheduler, fetch, extract,
//! filter discovered links back into the frontier, append the record.
//! A stop-condition breach sets a shared flag; workers finish the page
//! they're on (its record is still written) and dispatch nothing new.

use crate::config::{CrawlJob, EngineSettings};
use crate::crawler::fetcher::{build_http_client, fetch_url, FetchOutcome};
use crate::crawler::frontier::{Frontier, FrontierEntry};
use crate::crawler::scheduler::{Dispatch, Scheduler};
use crate::extract::{
    build_error_record, build_record, build_robots_blocked_record, CompiledSelectors, PageRecord,
    CUSTOM_HEADERS_KEY,
};
use crate::output::JsonlSink;
use crate::policy::LinkPolicy;
use crate::robots::RobotsCache;
use crate::state::{CrawlPhase, StopReason};
use crate::stats::CrawlStats;
use crate::url::{extract_domain, normalize_url};
use crate::Result;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::{Duration, Instant};

/// Summary of a finished crawl
#[derive(Debug)]
pub struct CrawlReport {
    pub phase: CrawlPhase,
    pub stop_reason: Option<StopReason>,
    pub pages_fetched: u64,
    pub items_emitted: u64,
    pub errors: u64,
    pub links_discovered: u64,
    pub robots_blocked: u64,
    /// Union of column names across every record written
    pub columns: Vec<String>,
    pub elapsed: Duration,
}

/// Shared state for one running crawl
struct CrawlContext {
    job: CrawlJob,
    settings: EngineSettings,
    policy: LinkPolicy,
    selectors: CompiledSelectors,
    custom_headers: HashMap<String, HashMap<String, String>>,
    client: Client,
    scheduler: Mutex<Scheduler>,
    sink: Mutex<JsonlSink>,
    stats: CrawlStats,
    robots: Option<RobotsCache>,
    stop: OnceLock<StopReason>,
    in_flight: AtomicUsize,
}

/// Main crawl coordinator
pub struct Coordinator {
    job: CrawlJob,
    phase: CrawlPhase,
}

impl Coordinator {
    pub fn new(job: CrawlJob) -> Self {
        Self {
            job,
            phase: CrawlPhase::Idle,
        }
    }

    /// Runs the crawl to completion
    ///
    /// Fatal job-level problems — invalid configuration, a malformed seed
    /// in list mode, an unwritable output file or job directory — abort
    /// here before anything is fetched, leaving the coordinator in the
    /// failed phase.
    pub async fn run(&mut self) -> Result<CrawlReport> {
        self.phase = CrawlPhase::Running;

        let ctx = match build_context(&self.job) {
            Ok(ctx) => Arc::new(ctx),
            Err(e) => {
                self.phase = CrawlPhase::Failed;
                return Err(e);
            }
        };

        let workers = ctx.settings.concurrent_requests;
        tracing::info!(
            "Starting crawl: {} workers, {} seeds queued, output {}",
            workers,
            ctx.scheduler.lock().unwrap().frontier_len(),
            ctx.job.output_file.display()
        );

        let mut tasks = tokio::task::JoinSet::new();
        for id in 0..workers {
            let ctx = Arc::clone(&ctx);
            tasks.spawn(worker(ctx, id));
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Worker task failed: {}", e);
            }
        }

        let stop_reason = ctx.stop.get().copied();
        self.phase = match stop_reason {
            Some(_) => CrawlPhase::StoppedByLimit,
            None => CrawlPhase::Completed,
        };

        let report = CrawlReport {
            phase: self.phase,
            stop_reason,
            pages_fetched: ctx.stats.pages_fetched(),
            items_emitted: ctx.stats.items_emitted(),
            errors: ctx.stats.errors(),
            links_discovered: ctx.stats.links_discovered(),
            robots_blocked: ctx.stats.robots_blocked(),
            columns: ctx.sink.lock().unwrap().columns(),
            elapsed: ctx.stats.elapsed(),
        };
        tracing::info!(
            "Crawl {}: {} pages fetched, {} rows written, {} errors in {:.1?}",
            self.phase,
            report.pages_fetched,
            report.items_emitted,
            report.errors,
            report.elapsed
        );
        Ok(report)
    }

    /// The coordinator's current lifecycle phase
    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }
}

/// Validates the job and assembles the shared crawl state
fn build_context(job: &CrawlJob) -> Result<CrawlContext> {
    crate::config::validate_job(job)?;

    let settings = EngineSettings::resolve(&job.custom_settings);
    let policy = LinkPolicy::from_job(job)?;
    let selectors = CompiledSelectors::from_job(job)?;
    let client = build_http_client(&settings)?;

    let mut frontier = match &job.job_dir {
        Some(dir) => Frontier::with_job_dir(dir)?,
        None => Frontier::new(),
    };

    let mut seeded = 0usize;
    for seed in &job.url_list {
        match normalize_url(seed) {
            Ok(url) => {
                if frontier.offer(url, 0, None) {
                    seeded += 1;
                }
            }
            Err(e) => {
                // In list mode the seed list is the entire crawl; a bad
                // entry is fatal
                if !job.follow_links {
                    return Err(crate::ConfigError::InvalidUrl(format!(
                        "seed URL '{}' is invalid: {}",
                        seed, e
                    ))
                    .into());
                }
                tracing::warn!("Skipping malformed seed URL '{}': {}", seed, e);
            }
        }
    }
    tracing::info!(
        "Seeded frontier with {} of {} URLs",
        seeded,
        job.url_list.len()
    );

    let sink = JsonlSink::open(&job.output_file)?;

    let robots = if settings.robotstxt_obey {
        Some(RobotsCache::new(client.clone(), settings.user_agent.clone()))
    } else {
        None
    };

    let custom_headers = parse_custom_headers(job);
    let scheduler = Scheduler::new(settings.clone(), frontier);

    Ok(CrawlContext {
        job: job.clone(),
        settings,
        policy,
        selectors,
        custom_headers,
        client,
        scheduler: Mutex::new(scheduler),
        sink: Mutex::new(sink),
        stats: CrawlStats::new(),
        robots,
        stop: OnceLock::new(),
        in_flight: AtomicUsize::new(0),
    })
}

/// Crawls a job and returns the final report
///
/// # Example
///
/// ```no_run
/// use rowcrawl::config::CrawlJob;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut job = CrawlJob::new(["https://example.com/"], "example.jl");
/// job.follow_links = true;
/// let report = rowcrawl::crawl(job).await?;
/// println!("{} rows", report.items_emitted);
/// # Ok(())
/// # }
/// ```
pub async fn crawl(job: CrawlJob) -> Result<CrawlReport> {
    let mut coordinator = Coordinator::new(job);
    coordinator.run().await
}

/// One worker: poll, fetch, extract, persist, repeat
async fn worker(ctx: Arc<CrawlContext>, id: usize) {
    tracing::debug!("Worker {} started", id);
    loop {
        if ctx.stop.get().is_some() {
            break;
        }

        if let Some(limit) = ctx.settings.closespider_timeout_secs {
            if ctx.stats.elapsed() >= Duration::from_secs(limit) {
                trigger_stop(&ctx, StopReason::Timeout);
                break;
            }
        }

        let dispatch = ctx.scheduler.lock().unwrap().poll_next(Instant::now());
        match dispatch {
            Dispatch::Fetch(entry) => {
                ctx.in_flight.fetch_add(1, Ordering::SeqCst);
                process_entry(&ctx, entry).await;
                ctx.in_flight.fetch_sub(1, Ordering::SeqCst);
            }
            Dispatch::Wait(wait) => {
                tokio::time::sleep(wait.min(Duration::from_millis(500))).await;
            }
            Dispatch::Exhausted => {
                // Another worker may still discover links
                if ctx.in_flight.load(Ordering::SeqCst) == 0 {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        }
    }
    tracing::debug!("Worker {} finished", id);
}

/// Fetches one frontier entry and persists its record
///
/// Per-page failures never escape this function; they become the record.
async fn process_entry(ctx: &CrawlContext, entry: FrontierEntry) {
    let domain = extract_domain(&entry.url).unwrap_or_default();

    if let Some(robots) = &ctx.robots {
        if !robots.is_allowed(&entry.url).await {
            tracing::info!("URL blocked by robots.txt: {}", entry.url);
            ctx.stats.record_robots_blocked();
            write_record(ctx, &build_robots_blocked_record(entry.url.as_str()));
            ctx.scheduler.lock().unwrap().release(&domain);
            return;
        }
    }

    let extra_headers = ctx.custom_headers.get(entry.url.as_str());
    let outcome = fetch_url(&ctx.client, &entry.url, &ctx.settings, extra_headers).await;

    match outcome {
        FetchOutcome::Page(page) => {
            let fetched = ctx.stats.record_page_fetched();
            tracing::debug!("Fetched {} ({})", page.url, page.status);

            let (record, links) = build_record(
                &page,
                entry.depth,
                &ctx.selectors,
                &ctx.job.meta,
                &ctx.settings,
            );
            write_record(ctx, &record);

            if ctx.job.follow_links && ctx.stop.get().is_none() {
                let mut enqueued = 0u64;
                {
                    let mut scheduler = ctx.scheduler.lock().unwrap();
                    for link in &links {
                        if !ctx.policy.should_follow(&link.url, entry.depth) {
                            continue;
                        }
                        if let Ok(normalized) = normalize_url(link.url.as_str()) {
                            if scheduler.offer(
                                normalized,
                                entry.depth + 1,
                                Some(page.url.to_string()),
                            ) {
                                enqueued += 1;
                            }
                        }
                    }
                }
                ctx.stats.record_links_discovered(enqueued);
            }

            if let Some(limit) = ctx.settings.closespider_pagecount {
                if fetched >= limit {
                    trigger_stop(ctx, StopReason::PageCount);
                }
            }
        }
        FetchOutcome::Failed { message } => {
            let errors = ctx.stats.record_error();
            tracing::warn!("Fetch failed for {}: {}", entry.url, message);
            write_record(ctx, &build_error_record(entry.url.as_str(), &message));

            if let Some(limit) = ctx.settings.closespider_errorcount {
                if errors >= limit {
                    trigger_stop(ctx, StopReason::ErrorCount);
                }
            }
        }
    }

    ctx.scheduler.lock().unwrap().release(&domain);
}

/// Appends a record to the sink and bumps the item counters
fn write_record(ctx: &CrawlContext, record: &PageRecord) {
    let write_result = ctx.sink.lock().unwrap().write_record(record);
    match write_result {
        Ok(()) => {
            let items = ctx.stats.record_item_emitted();
            if let Some(limit) = ctx.settings.closespider_itemcount {
                if items >= limit {
                    trigger_stop(ctx, StopReason::ItemCount);
                }
            }
        }
        Err(e) => {
            tracing::error!("Failed to write record: {}", e);
        }
    }
}

fn trigger_stop(ctx: &CrawlContext, reason: StopReason) {
    if ctx.stop.set(reason).is_ok() {
        tracing::info!("Stop condition hit: {}", reason);
    }
}

/// Pulls the per-URL request-header table out of the job's meta
fn parse_custom_headers(job: &CrawlJob) -> HashMap<String, HashMap<String, String>> {
    let mut table = HashMap::new();

    let Some(serde_json::Value::Object(by_url)) = job.meta.get(CUSTOM_HEADERS_KEY) else {
        return table;
    };

    for (url, headers) in by_url {
        let serde_json::Value::Object(headers) = headers else {
            tracing::warn!("Ignoring non-object custom_headers entry for {}", url);
            continue;
        };
        let mut parsed = HashMap::new();
        for (name, value) in headers {
            if let serde_json::Value::String(value) = value {
                parsed.insert(name.clone(), value.clone());
            }
        }
        table.insert(url.clone(), parsed);
    }

    table
}
