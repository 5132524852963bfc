//! The crawl engine: fetching, frontier management, and orchestration

mod coordinator;
mod fetcher;
mod frontier;
mod scheduler;

pub use coordinator::{crawl, Coordinator, CrawlReport};
pub use fetcher::{build_http_client, fetch_url, FetchOutcome, FetchedPage};
pub use frontier::{Frontier, FrontierEntry};
pub use scheduler::{Dispatch, Scheduler};
