//! Link-follow policy
//!
//! Decides, per discovered link, whether it re-enters the frontier. The
//! policy is a pure function of the link, its discovery depth, and the job
//! configuration; it has no side effects and holds no crawl state.

use crate::config::{CrawlJob, ParamFilter};
use crate::url::{domain_allowed, extract_domain};
use crate::ConfigError;
use regex::Regex;
use std::collections::HashSet;
use url::Url;

/// Compiled link-follow policy for one job
#[derive(Debug)]
pub struct LinkPolicy {
    follow_links: bool,
    allowed_domains: Vec<String>,
    exclude_all_params: bool,
    exclude_params: Option<HashSet<String>>,
    include_params: Option<HashSet<String>>,
    exclude_regex: Option<Regex>,
    include_regex: Option<Regex>,
    depth_limit: Option<u32>,
}

impl LinkPolicy {
    /// Compiles the policy from a validated job
    ///
    /// When `allowed-domains` is unset the seed hosts are used, so a crawl
    /// never wanders off the sites it was pointed at.
    pub fn from_job(job: &CrawlJob) -> Result<Self, ConfigError> {
        let allowed_domains = match &job.allowed_domains {
            Some(domains) => domains.iter().map(|d| d.to_lowercase()).collect(),
            None => {
                let mut hosts = Vec::new();
                for seed in &job.url_list {
                    if let Ok(url) = Url::parse(seed.trim()) {
                        if let Some(host) = extract_domain(&url) {
                            if !hosts.contains(&host) {
                                hosts.push(host);
                            }
                        }
                    }
                }
                hosts
            }
        };

        let (exclude_all_params, exclude_params) = match &job.exclude_url_params {
            Some(ParamFilter::Any(flag)) => (*flag, None),
            Some(ParamFilter::Keys(keys)) => (false, Some(keys.iter().cloned().collect())),
            None => (false, None),
        };

        let compile = |pattern: &Option<String>| -> Result<Option<Regex>, ConfigError> {
            pattern
                .as_ref()
                .map(|p| {
                    Regex::new(p).map_err(|e| ConfigError::InvalidRegex {
                        pattern: p.clone(),
                        message: e.to_string(),
                    })
                })
                .transpose()
        };

        Ok(Self {
            follow_links: job.follow_links,
            allowed_domains,
            exclude_all_params,
            exclude_params,
            include_params: job
                .include_url_params
                .as_ref()
                .map(|keys| keys.iter().cloned().collect()),
            exclude_regex: compile(&job.exclude_url_regex)?,
            include_regex: compile(&job.include_url_regex)?,
            depth_limit: job.depth_limit,
        })
    }

    /// Decides whether a link discovered at `depth` should be enqueued
    ///
    /// Rules apply in order: allowed domains, follow flag, URL parameter
    /// filters, URL regex filters, depth limit.
    pub fn should_follow(&self, url: &Url, depth: u32) -> bool {
        let host = match extract_domain(url) {
            Some(h) => h,
            None => return false,
        };
        if !domain_allowed(&self.allowed_domains, &host) {
            return false;
        }

        if !self.follow_links {
            return false;
        }

        let query_keys: HashSet<String> =
            url.query_pairs().map(|(k, _)| k.into_owned()).collect();

        if self.exclude_all_params && !query_keys.is_empty() {
            return false;
        }

        if let Some(exclude) = &self.exclude_params {
            if query_keys.iter().any(|k| exclude.contains(k)) {
                return false;
            }
        }

        if let Some(include) = &self.include_params {
            if !query_keys.iter().any(|k| include.contains(k)) {
                return false;
            }
        }

        let url_str = url.as_str();
        if let Some(exclude) = &self.exclude_regex {
            if exclude.is_match(url_str) {
                return false;
            }
        }

        if let Some(include) = &self.include_regex {
            if !include.is_match(url_str) {
                return false;
            }
        }

        if let Some(limit) = self.depth_limit {
            if depth >= limit {
                return false;
            }
        }

        true
    }

    /// The resolved allowed-domains list (seed hosts when not configured)
    pub fn allowed_domains(&self) -> &[String] {
        &self.allowed_domains
    }
}
