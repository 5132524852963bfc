//! Integration tests for the crawler
//!
//! These use wiremock to stand up mock HTTP servers and exercise full
//! crawl cycles end-to-end: list and discovery modes, dedup, link policy,
//! stop conditions, resume, and failure rows.

mod crawl_tests;
mod resume_tests;

use rowcrawl::config::CrawlJob;
use serde_json::Value;
use std::path::Path;

/// Builds a job against a mock server with fast test-friendly settings
pub fn test_job(seeds: Vec<String>, output_file: &Path) -> CrawlJob {
    let mut job = CrawlJob::new(seeds, output_file);
    job.custom_settings.robotstxt_obey = Some(false);
    job.custom_settings.download_delay = Some(0.0);
    job.custom_settings.concurrent_requests = Some(2);
    job
}

/// Reads the output file back as parsed JSON rows
pub fn read_rows(path: &Path) -> Vec<Value> {
    let content = std::fs::read_to_string(path).expect("output file should exist");
    content
        .lines()
        .map(|line| serde_json::from_str(line).expect("each line should be valid JSON"))
        .collect()
}

/// Finds the row for a URL containing the given path suffix
pub fn row_for<'a>(rows: &'a [Value], url_part: &str) -> &'a Value {
    rows.iter()
        .find(|row| {
            row.get("url")
                .and_then(Value::as_str)
                .map(|u| u.contains(url_part))
                .unwrap_or(false)
        })
        .unwrap_or_else(|| panic!("no row with url containing '{}'", url_part))
}
