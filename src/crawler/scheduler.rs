//! Dispatch scheduling
//!
//! Wraps the frontier with per-domain pacing. Workers poll for the next
//! dispatchable entry; the scheduler never sleeps while locked, it tells
//! the caller how long to wait instead, so many workers can share it
//! behind one mutex.

use crate::config::EngineSettings;
use crate::crawler::frontier::{Frontier, FrontierEntry};
use crate::state::DomainState;
use crate::url::extract_domain;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// What a worker should do next
#[derive(Debug)]
pub enum Dispatch {
    /// Fetch this entry now
    Fetch(FrontierEntry),

    /// Nothing dispatchable yet; wait roughly this long and poll again
    Wait(Duration),

    /// The frontier is empty
    Exhausted,
}

/// Frontier plus per-domain pacing state
pub struct Scheduler {
    frontier: Frontier,
    domains: HashMap<String, DomainState>,
    settings: EngineSettings,
}

impl Scheduler {
    pub fn new(settings: EngineSettings, frontier: Frontier) -> Self {
        Self {
            frontier,
            domains: HashMap::new(),
            settings,
        }
    }

    /// Offers a URL to the frontier
    pub fn offer(&mut self, url: url::Url, depth: u32, referrer: Option<String>) -> bool {
        self.frontier.offer(url, depth, referrer)
    }

    /// Finds the next entry whose domain is ready
    ///
    /// Entries whose domain is still pacing rotate to the rear, preserving
    /// rough FIFO order per domain. When nothing is ready the smallest
    /// remaining wait across queued domains is reported.
    pub fn poll_next(&mut self, now: Instant) -> Dispatch {
        if self.frontier.is_empty() {
            return Dispatch::Exhausted;
        }

        let queued = self.frontier.len();
        for _ in 0..queued {
            let entry = match self.frontier.pop() {
                Some(entry) => entry,
                None => break,
            };

            let domain = entry_domain(&entry);
            let state = self.domains.entry(domain).or_default();

            if state.can_request(&self.settings, now) {
                state.record_dispatch(now);
                self.frontier.mark_consumed(&entry.url);
                return Dispatch::Fetch(entry);
            }

            self.frontier.requeue(entry);
        }

        Dispatch::Wait(self.minimum_wait(now))
    }

    /// Records that a fetch to a domain finished
    pub fn release(&mut self, domain: &str) {
        if let Some(state) = self.domains.get_mut(domain) {
            state.record_completion();
        }
    }

    fn minimum_wait(&self, now: Instant) -> Duration {
        let mut min_wait = Duration::from_millis(500);

        for entry in self.frontier.iter() {
            match self.domains.get(&entry_domain(entry)) {
                Some(state) => {
                    if let Some(wait) = state.time_until_ready(&self.settings, now) {
                        if wait < min_wait {
                            min_wait = wait;
                        }
                    } else {
                        return Duration::from_millis(10);
                    }
                }
                None => return Duration::from_millis(10),
            }
        }

        min_wait.max(Duration::from_millis(10))
    }

    pub fn frontier_len(&self) -> usize {
        self.frontier.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.frontier.is_empty()
    }
}

fn entry_domain(entry: &FrontierEntry) -> String {
    extract_domain(&entry.url).unwrap_or_default()
}
