/// Crawl lifecycle definitions
///
/// A job moves through exactly one of these paths:
/// Idle -> Running -> Completed | StoppedByLimit | Failed
use std::fmt;

/// The lifecycle phase of a crawl job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    /// Job constructed, nothing fetched yet
    Idle,

    /// Workers are fetching
    Running,

    /// Frontier exhausted with no limit breach
    Completed,

    /// A configured threshold ended the crawl early; output so far is kept
    StoppedByLimit,

    /// Fatal job-level error before any fetch
    Failed,
}

impl CrawlPhase {
    /// Returns true if no further work will happen in this phase
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Idle | Self::Running)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::StoppedByLimit => "stopped_by_limit",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which configured threshold ended a crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// CLOSESPIDER_ERRORCOUNT reached
    ErrorCount,

    /// CLOSESPIDER_ITEMCOUNT reached
    ItemCount,

    /// CLOSESPIDER_PAGECOUNT reached
    PageCount,

    /// CLOSESPIDER_TIMEOUT elapsed
    Timeout,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ErrorCount => "error_count",
            Self::ItemCount => "item_count",
            Self::PageCount => "page_count",
            Self::Timeout => "timeout",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
