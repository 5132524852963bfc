use crate::config::EngineSettings;
use std::time::{Duration, Instant};

/// Tracks per-domain dispatch state during a crawl
///
/// Enforces the two politeness knobs that apply per host: the delay between
/// consecutive requests (DOWNLOAD_DELAY) and the number of requests allowed
/// in flight at once (CONCURRENT_REQUESTS_PER_DOMAIN).
#[derive(Debug, Clone)]
pub struct DomainState {
    /// Number of requests dispatched to this domain so far
    pub request_count: u64,

    /// When the last request to this domain was dispatched
    pub last_request_time: Option<Instant>,

    /// Requests currently in flight to this domain
    pub in_flight: u32,
}

impl DomainState {
    pub fn new() -> Self {
        Self {
            request_count: 0,
            last_request_time: None,
            in_flight: 0,
        }
    }

    /// Checks if a request to this domain can be dispatched now
    pub fn can_request(&self, settings: &EngineSettings, now: Instant) -> bool {
        if self.in_flight >= settings.concurrent_requests_per_domain {
            return false;
        }

        if let Some(last) = self.last_request_time {
            if now.duration_since(last) < settings.download_delay() {
                return false;
            }
        }

        true
    }

    /// Time until this domain's delay budget allows another request
    ///
    /// Returns None when the domain is ready now. A domain waiting only on
    /// its in-flight cap has no time-based hint; it reports a small poll
    /// interval instead.
    pub fn time_until_ready(&self, settings: &EngineSettings, now: Instant) -> Option<Duration> {
        if self.in_flight >= settings.concurrent_requests_per_domain {
            return Some(Duration::from_millis(50));
        }

        let last = self.last_request_time?;
        let delay = settings.download_delay();
        let elapsed = now.duration_since(last);
        if elapsed >= delay {
            None
        } else {
            Some(delay - elapsed)
        }
    }

    /// Records that a request was dispatched to this domain
    pub fn record_dispatch(&mut self, now: Instant) {
        self.request_count += 1;
        self.in_flight += 1;
        self.last_request_time = Some(now);
    }

    /// Records that a request to this domain finished (success or failure)
    pub fn record_completion(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }
}

impl Default for DomainState {
    fn default() -> Self {
        Self::new()
    }
}
