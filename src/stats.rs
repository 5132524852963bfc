//! Crawl statistics
//!
//! Lock-free counters shared by every worker; snapshotted into the final
//! report and logged as the crawl progresses.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Counters for one crawl job
#[derive(Debug)]
pub struct CrawlStats {
    pub pages_fetched: AtomicU64,
    pub items_emitted: AtomicU64,
    pub errors: AtomicU64,
    pub links_discovered: AtomicU64,
    pub robots_blocked: AtomicU64,
    started: Instant,
}

impl CrawlStats {
    pub fn new() -> Self {
        Self {
            pages_fetched: AtomicU64::new(0),
            items_emitted: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            links_discovered: AtomicU64::new(0),
            robots_blocked: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    pub fn record_page_fetched(&self) -> u64 {
        self.pages_fetched.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn record_item_emitted(&self) -> u64 {
        self.items_emitted.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn record_error(&self) -> u64 {
        self.errors.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn record_links_discovered(&self, count: u64) {
        self.links_discovered.fetch_add(count, Ordering::SeqCst);
    }

    pub fn record_robots_blocked(&self) {
        self.robots_blocked.fetch_add(1, Ordering::SeqCst);
    }

    pub fn pages_fetched(&self) -> u64 {
        self.pages_fetched.load(Ordering::SeqCst)
    }

    pub fn items_emitted(&self) -> u64 {
        self.items_emitted.load(Ordering::SeqCst)
    }

    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::SeqCst)
    }

    pub fn links_discovered(&self) -> u64 {
        self.links_discovered.load(Ordering::SeqCst)
    }

    pub fn robots_blocked(&self) -> u64 {
        self.robots_blocked.load(Ordering::SeqCst)
    }

    pub fn elapsed(&self) -> std::time::Duration {
        self.started.elapsed()
    }
}

impl Default for CrawlStats {
    fn default() -> Self {
        Self::new()
    }
}
