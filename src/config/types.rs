use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// A crawl job definition
///
/// Immutable once the crawl starts. Loadable from a TOML file or built in
/// code; see [`CrawlJob::new`] for the minimal programmatic form.
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlJob {
    /// Seed URLs. In list mode these are exactly the pages fetched
    #[serde(rename = "url-list")]
    pub url_list: Vec<String>,

    /// Output path; must end in .jl or .jsonl
    #[serde(rename = "output-file")]
    pub output_file: PathBuf,

    /// Follow links discovered on crawled pages (discovery mode)
    #[serde(rename = "follow-links", default)]
    pub follow_links: bool,

    /// Hosts the crawler may visit; defaults to the seed hosts
    #[serde(rename = "allowed-domains", default)]
    pub allowed_domains: Option<Vec<String>>,

    /// Don't follow links carrying these query parameters
    /// (or any parameter at all, when set to `true`)
    #[serde(rename = "exclude-url-params", default)]
    pub exclude_url_params: Option<ParamFilter>,

    /// Only follow links carrying at least one of these query parameters
    #[serde(rename = "include-url-params", default)]
    pub include_url_params: Option<Vec<String>>,

    /// Don't follow links whose URL matches this pattern
    #[serde(rename = "exclude-url-regex", default)]
    pub exclude_url_regex: Option<String>,

    /// Only follow links whose URL matches this pattern
    #[serde(rename = "include-url-regex", default)]
    pub include_url_regex: Option<String>,

    /// Links discovered at this depth or deeper are not followed
    #[serde(rename = "depth-limit", default)]
    pub depth_limit: Option<u32>,

    /// Column name -> CSS selector (`::text` / `::attr(name)` modifiers)
    #[serde(rename = "css-selectors", default)]
    pub css_selectors: HashMap<String, String>,

    /// Column name -> XPath expression (translated subset)
    #[serde(rename = "xpath-selectors", default)]
    pub xpath_selectors: HashMap<String, String>,

    /// Extra key/value pairs copied onto every record
    #[serde(default)]
    pub meta: HashMap<String, serde_json::Value>,

    /// Engine-level overrides, canonical SCREAMING_SNAKE keys
    #[serde(rename = "custom-settings", default)]
    pub custom_settings: CustomSettings,

    /// Directory holding resume state (the seen file); enables pause/resume
    #[serde(rename = "job-dir", default)]
    pub job_dir: Option<PathBuf>,

    /// Optional human-readable crawl log file
    #[serde(rename = "log-file", default)]
    pub log_file: Option<PathBuf>,
}

impl CrawlJob {
    /// Creates a job with the given seeds and output file, everything else
    /// at its default
    pub fn new<I, S>(url_list: I, output_file: impl Into<PathBuf>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            url_list: url_list.into_iter().map(Into::into).collect(),
            output_file: output_file.into(),
            follow_links: false,
            allowed_domains: None,
            exclude_url_params: None,
            include_url_params: None,
            exclude_url_regex: None,
            include_url_regex: None,
            depth_limit: None,
            css_selectors: HashMap::new(),
            xpath_selectors: HashMap::new(),
            meta: HashMap::new(),
            custom_settings: CustomSettings::default(),
            job_dir: None,
            log_file: None,
        }
    }
}

/// A query-parameter filter: either a list of keys or "any parameter"
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ParamFilter {
    /// `true` means every parameterized link matches the filter
    Any(bool),
    /// Only links carrying one of these keys match
    Keys(Vec<String>),
}

/// Engine-level overrides as they appear in a job's `custom-settings` table
///
/// Keys keep the engine's canonical SCREAMING_SNAKE names so jobs read the
/// same as the settings documentation. All fields are optional; anything
/// unset falls through to the built-in default.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomSettings {
    #[serde(rename = "USER_AGENT", default)]
    pub user_agent: Option<String>,

    #[serde(rename = "ROBOTSTXT_OBEY", default)]
    pub robotstxt_obey: Option<bool>,

    #[serde(rename = "CONCURRENT_REQUESTS", default)]
    pub concurrent_requests: Option<usize>,

    #[serde(rename = "CONCURRENT_REQUESTS_PER_DOMAIN", default)]
    pub concurrent_requests_per_domain: Option<u32>,

    /// Seconds between requests to the same host; fractional allowed
    #[serde(rename = "DOWNLOAD_DELAY", default)]
    pub download_delay: Option<f64>,

    #[serde(rename = "DOWNLOAD_TIMEOUT", default)]
    pub download_timeout: Option<u64>,

    #[serde(rename = "REDIRECT_MAX_TIMES", default)]
    pub redirect_max_times: Option<u32>,

    #[serde(rename = "DEFAULT_REQUEST_HEADERS", default)]
    pub default_request_headers: Option<HashMap<String, String>>,

    #[serde(rename = "CLOSESPIDER_ERRORCOUNT", default)]
    pub closespider_errorcount: Option<u64>,

    #[serde(rename = "CLOSESPIDER_ITEMCOUNT", default)]
    pub closespider_itemcount: Option<u64>,

    #[serde(rename = "CLOSESPIDER_PAGECOUNT", default)]
    pub closespider_pagecount: Option<u64>,

    /// Seconds of wall-clock time before the crawl stops gracefully
    #[serde(rename = "CLOSESPIDER_TIMEOUT", default)]
    pub closespider_timeout: Option<u64>,
}

/// Fully resolved engine settings
///
/// Built once at job start: defaults overlaid by the job's custom settings.
/// Passed explicitly wherever needed; there is no ambient settings state.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub user_agent: String,
    pub robotstxt_obey: bool,
    pub concurrent_requests: usize,
    pub concurrent_requests_per_domain: u32,
    pub download_delay_secs: f64,
    pub download_timeout_secs: u64,
    pub redirect_max_times: u32,
    pub default_request_headers: HashMap<String, String>,
    pub closespider_errorcount: Option<u64>,
    pub closespider_itemcount: Option<u64>,
    pub closespider_pagecount: Option<u64>,
    pub closespider_timeout_secs: Option<u64>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            user_agent: format!("rowcrawl/{}", env!("CARGO_PKG_VERSION")),
            robotstxt_obey: true,
            concurrent_requests: 16,
            concurrent_requests_per_domain: 8,
            download_delay_secs: 0.0,
            download_timeout_secs: 180,
            redirect_max_times: 20,
            default_request_headers: HashMap::new(),
            closespider_errorcount: None,
            closespider_itemcount: None,
            closespider_pagecount: None,
            closespider_timeout_secs: None,
        }
    }
}

impl EngineSettings {
    /// Resolves the final settings: defaults overlaid by job overrides
    pub fn resolve(overrides: &CustomSettings) -> Self {
        let mut settings = Self::default();
        if let Some(ua) = &overrides.user_agent {
            settings.user_agent = ua.clone();
        }
        if let Some(obey) = overrides.robotstxt_obey {
            settings.robotstxt_obey = obey;
        }
        if let Some(n) = overrides.concurrent_requests {
            settings.concurrent_requests = n;
        }
        if let Some(n) = overrides.concurrent_requests_per_domain {
            settings.concurrent_requests_per_domain = n;
        }
        if let Some(d) = overrides.download_delay {
            settings.download_delay_secs = d;
        }
        if let Some(t) = overrides.download_timeout {
            settings.download_timeout_secs = t;
        }
        if let Some(n) = overrides.redirect_max_times {
            settings.redirect_max_times = n;
        }
        if let Some(headers) = &overrides.default_request_headers {
            settings.default_request_headers = headers.clone();
        }
        settings.closespider_errorcount = overrides.closespider_errorcount;
        settings.closespider_itemcount = overrides.closespider_itemcount;
        settings.closespider_pagecount = overrides.closespider_pagecount;
        settings.closespider_timeout_secs = overrides.closespider_timeout;
        settings
    }

    /// The per-host delay as a Duration
    pub fn download_delay(&self) -> Duration {
        Duration::from_secs_f64(self.download_delay_secs.max(0.0))
    }

    /// The per-request timeout as a Duration
    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }
}
