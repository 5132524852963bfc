//! Crawl lifecycle and per-domain state tracking

mod domain_state;
mod phase;

pub use domain_state::DomainState;
pub use phase::{CrawlPhase, StopReason};
