//! Page-record extraction
//!
//! Turns one fetched page into one flat output record. Extraction runs per
//! category (document tags, structured data, links, images, custom
//! selectors); a failure in any category lands in the record's `errors` /
//! `jsonld_errors` columns and never drops the row.

mod content;
mod images;
mod links;
mod record;
mod selectors;
mod structured;
mod xpath;

pub use links::{extract_links, ExtractedLink};
pub use record::{is_standard_column, PageRecord, MULTI_VALUE_SEP, STANDARD_COLUMNS};
pub use selectors::{parse_css_selector, CompiledSelectors, FieldSelector, SelectMode};
pub use xpath::translate_xpath;

use crate::config::EngineSettings;
use crate::crawler::FetchedPage;
use scraper::Html;
use serde_json::Value;
use std::collections::HashMap;

/// Reserved meta key carrying per-URL request headers, never a column
pub const CUSTOM_HEADERS_KEY: &str = "custom_headers";

/// Builds the output record for a fetched page
///
/// Parses the HTML once, then runs every extraction category. Also returns
/// the page's outbound links so the caller can feed the follow policy
/// without a second parse.
pub fn build_record(
    page: &FetchedPage,
    depth: u32,
    compiled: &CompiledSelectors,
    meta: &HashMap<String, Value>,
    settings: &EngineSettings,
) -> (PageRecord, Vec<ExtractedLink>) {
    let doc = Html::parse_document(&page.body);
    let mut record = PageRecord::new();

    record.insert_str("url", page.url.as_str());

    for (column, value) in content::extract_content_tags(&doc) {
        record.insert_str(column, value);
    }

    for (column, value) in structured::extract_open_graph(&doc) {
        record.insert_str(column, value);
    }

    for (column, value) in structured::extract_twitter_card(&doc) {
        record.insert_str(column, value);
    }

    let jsonld = structured::extract_jsonld(&doc);
    for (column, value) in jsonld.fields {
        record.insert(column, value);
    }
    for message in &jsonld.errors {
        record.append_error("jsonld_errors", message);
    }

    record.insert_str("body_text", content::extract_body_text(&doc));
    record.insert("size", Value::from(page.body.len()));

    for (name, selector) in compiled.iter() {
        if let Some(value) = selector.extract(&doc) {
            record.insert_str(name, value);
        }
    }

    for (key, value) in meta {
        if key != CUSTOM_HEADERS_KEY {
            record.insert(key.clone(), value.clone());
        }
    }

    record.insert("depth", Value::from(depth));
    record.insert("download_latency", Value::from(page.download_latency));
    record.insert(
        "download_timeout",
        Value::from(settings.download_timeout_secs),
    );
    if !page.redirect_urls.is_empty() {
        record.insert("redirect_times", Value::from(page.redirect_urls.len()));
        record.insert("redirect_ttl", Value::from(settings.redirect_max_times));
        record.insert_str("redirect_urls", page.redirect_urls.join(MULTI_VALUE_SEP));
        record.insert_str(
            "redirect_reasons",
            page.redirect_reasons
                .iter()
                .map(|code| code.to_string())
                .collect::<Vec<_>>()
                .join(MULTI_VALUE_SEP),
        );
    }
    record.insert("status", Value::from(page.status));

    let all_links = links::extract_links(&doc, &page.url);
    insert_link_columns(&mut record, "links", &all_links);
    for scope in ["nav", "header", "footer"] {
        let scoped = links::extract_scoped_links(&doc, &page.url, scope);
        insert_link_columns(&mut record, &format!("{}_links", scope), &scoped);
    }

    for (column, value) in images::extract_images(&doc, &page.url) {
        record.insert_str(column, value);
    }

    if let Some(addr) = &page.remote_addr {
        record.insert_str("ip_address", addr);
    }
    record.insert_str("crawl_time", crawl_time());

    for (name, value) in &page.resp_headers {
        record.insert_str(format!("resp_headers_{}", name), value);
    }
    for (name, value) in &page.request_headers {
        record.insert_str(format!("request_headers_{}", name), value);
    }

    (record, all_links)
}

/// Builds the partial record for a URL whose fetch failed
///
/// One row per attempted fetch, always: the failure text goes in `errors`
/// and the row is emitted like any other.
pub fn build_error_record(url: &str, message: &str) -> PageRecord {
    let mut record = PageRecord::new();
    record.insert_str("url", url);
    record.insert_str("crawl_time", crawl_time());
    record.append_error("errors", message);
    record
}

/// Builds the minimal record for a URL blocked by robots.txt
pub fn build_robots_blocked_record(url: &str) -> PageRecord {
    let mut record = PageRecord::new();
    record.insert_str("url", url);
    record.insert_str("crawl_time", crawl_time());
    record.insert("blocked_by_robotstxt", Value::Bool(true));
    record
}

fn insert_link_columns(record: &mut PageRecord, prefix: &str, links: &[ExtractedLink]) {
    if links.is_empty() {
        return;
    }

    record.insert_str(
        format!("{}_url", prefix),
        links
            .iter()
            .map(|l| l.url.to_string())
            .collect::<Vec<_>>()
            .join(MULTI_VALUE_SEP),
    );
    record.insert(
        format!("{}_text", prefix),
        Value::String(
            links
                .iter()
                .map(|l| l.text.clone())
                .collect::<Vec<_>>()
                .join(MULTI_VALUE_SEP),
        ),
    );
    record.insert_str(
        format!("{}_nofollow", prefix),
        links
            .iter()
            .map(|l| l.nofollow.to_string())
            .collect::<Vec<_>>()
            .join(MULTI_VALUE_SEP),
    );
}

fn crawl_time() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}
