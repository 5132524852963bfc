use crate::config::types::{CrawlJob, CustomSettings, ParamFilter};
use crate::extract::{is_standard_column, parse_css_selector, translate_xpath};
use crate::url::normalize_url;
use crate::ConfigError;
use std::collections::HashSet;

/// Validates a job before anything is fetched
///
/// Everything checked here is a job-level, fail-fast error. Problems that
/// can only surface per page (timeouts, malformed HTML, bad JSON-LD) are
/// handled during the crawl and recorded in the output instead.
pub fn validate_job(job: &CrawlJob) -> Result<(), ConfigError> {
    validate_seeds(job)?;
    validate_output_file(job)?;
    validate_selectors(job)?;
    validate_link_filters(job)?;
    validate_settings(&job.custom_settings)?;
    Ok(())
}

/// Validates the seed list
///
/// In list mode every seed must parse, since the seed list is the entire
/// crawl. In discovery mode a malformed seed is skipped at runtime with a
/// log line instead.
fn validate_seeds(job: &CrawlJob) -> Result<(), ConfigError> {
    if job.url_list.is_empty() {
        return Err(ConfigError::Validation(
            "url-list must contain at least one URL".to_string(),
        ));
    }

    if !job.follow_links {
        for seed in &job.url_list {
            normalize_url(seed).map_err(|e| {
                ConfigError::InvalidUrl(format!("seed URL '{}' is invalid: {}", seed, e))
            })?;
        }
    }

    Ok(())
}

/// The output must be a jsonlines file
fn validate_output_file(job: &CrawlJob) -> Result<(), ConfigError> {
    let ext = job
        .output_file
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");

    if ext != "jl" && ext != "jsonl" {
        return Err(ConfigError::Validation(format!(
            "output-file must end with '.jl' or '.jsonl', got '{}'",
            job.output_file.display()
        )));
    }

    Ok(())
}

/// Validates custom selector maps
///
/// Selector names become column keys, so they may not collide with the
/// standard columns or with each other, and every expression must compile.
fn validate_selectors(job: &CrawlJob) -> Result<(), ConfigError> {
    let css_names: HashSet<&String> = job.css_selectors.keys().collect();
    let xpath_names: HashSet<&String> = job.xpath_selectors.keys().collect();

    let mut shared: Vec<&str> = css_names
        .intersection(&xpath_names)
        .map(|s| s.as_str())
        .collect();
    if !shared.is_empty() {
        shared.sort_unstable();
        return Err(ConfigError::Validation(format!(
            "selector names used in both css-selectors and xpath-selectors: {}",
            shared.join(", ")
        )));
    }

    for name in css_names.iter().chain(xpath_names.iter()) {
        if is_standard_column(name) {
            return Err(ConfigError::Validation(format!(
                "selector name '{}' collides with a standard column",
                name
            )));
        }
        if name.is_empty() {
            return Err(ConfigError::Validation(
                "selector names must not be empty".to_string(),
            ));
        }
    }

    for (name, expr) in &job.css_selectors {
        parse_css_selector(expr).map_err(|message| ConfigError::InvalidSelector {
            name: name.clone(),
            message,
        })?;
    }

    for (name, expr) in &job.xpath_selectors {
        translate_xpath(expr).map_err(|message| ConfigError::InvalidSelector {
            name: name.clone(),
            message,
        })?;
    }

    Ok(())
}

/// Validates the link-follow filters for internal contradictions
fn validate_link_filters(job: &CrawlJob) -> Result<(), ConfigError> {
    if let (Some(exclude), Some(include)) = (&job.exclude_url_params, &job.include_url_params) {
        match exclude {
            ParamFilter::Any(true) => {
                return Err(ConfigError::Validation(
                    "exclude-url-params = true excludes every parameterized link, \
                     which contradicts include-url-params"
                        .to_string(),
                ));
            }
            ParamFilter::Keys(keys) => {
                let common: Vec<&str> = keys
                    .iter()
                    .filter(|k| include.contains(k))
                    .map(|k| k.as_str())
                    .collect();
                if !common.is_empty() {
                    return Err(ConfigError::Validation(format!(
                        "parameters both included and excluded: {}",
                        common.join(", ")
                    )));
                }
            }
            ParamFilter::Any(false) => {}
        }
    }

    if let (Some(exclude), Some(include)) = (&job.exclude_url_regex, &job.include_url_regex) {
        if exclude == include {
            return Err(ConfigError::Validation(format!(
                "the same pattern '{}' is both included and excluded",
                exclude
            )));
        }
    }

    for pattern in [&job.exclude_url_regex, &job.include_url_regex]
        .into_iter()
        .flatten()
    {
        regex::Regex::new(pattern).map_err(|e| ConfigError::InvalidRegex {
            pattern: pattern.clone(),
            message: e.to_string(),
        })?;
    }

    Ok(())
}

/// Sanity checks for engine-level overrides
fn validate_settings(settings: &CustomSettings) -> Result<(), ConfigError> {
    if settings.concurrent_requests == Some(0) {
        return Err(ConfigError::Validation(
            "CONCURRENT_REQUESTS must be at least 1".to_string(),
        ));
    }

    if settings.concurrent_requests_per_domain == Some(0) {
        return Err(ConfigError::Validation(
            "CONCURRENT_REQUESTS_PER_DOMAIN must be at least 1".to_string(),
        ));
    }

    if settings.download_timeout == Some(0) {
        return Err(ConfigError::Validation(
            "DOWNLOAD_TIMEOUT must be at least 1 second".to_string(),
        ));
    }

    if let Some(delay) = settings.download_delay {
        if !delay.is_finite() || delay < 0.0 {
            return Err(ConfigError::Validation(format!(
                "DOWNLOAD_DELAY must be a non-negative number, got {}",
                delay
            )));
        }
    }

    Ok(())
}
