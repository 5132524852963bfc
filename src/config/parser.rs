use crate::config::types::CrawlJob;
use crate::config::validation::validate_job;
use crate::ConfigError;
use std::path::Path;

/// Loads, parses, and validates a job file
///
/// # Arguments
///
/// * `path` - Path to the TOML job file
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use rowcrawl::config::load_job;
///
/// let job = load_job(Path::new("job.toml")).unwrap();
/// println!("Seeds: {}", job.url_list.len());
/// ```
pub fn load_job(path: &Path) -> Result<CrawlJob, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let job: CrawlJob = toml::from_str(&content)?;
    validate_job(&job)?;
    Ok(job)
}
