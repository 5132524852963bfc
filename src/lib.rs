//! Rowcrawl: a concurrent SEO page-record crawler
//!
//! This crate implements a crawler that fetches pages concurrently, extracts
//! a fixed+dynamic schema of SEO fields per page, and appends one JSON
//! object per fetched URL to a line-delimited output file. Crawls can follow
//! links under a configurable policy or fetch a fixed URL list, and can be
//! paused and resumed through a job directory.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod policy;
pub mod robots;
pub mod state;
pub mod stats;
pub mod url;

use thiserror::Error;

/// Main error type for rowcrawl operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Output error for {path}: {source}")]
    Output {
        path: String,
        source: std::io::Error,
    },

    #[error("Job directory error: {0}")]
    JobDir(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read job file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in job: {0}")]
    InvalidUrl(String),

    #[error("Invalid regex pattern '{pattern}': {message}")]
    InvalidRegex { pattern: String, message: String },

    #[error("Invalid selector '{name}': {message}")]
    InvalidSelector { name: String, message: String },
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for rowcrawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::{CrawlJob, EngineSettings};
pub use crawler::{crawl, CrawlReport};
pub use state::{CrawlPhase, StopReason};
