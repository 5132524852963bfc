//! Robots.txt handling
//!
//! When ROBOTSTXT_OBEY is set, each host's robots.txt is fetched once and
//! its verdicts cached for the rest of the job. A fetch failure means the
//! host has no enforceable rules, so everything is allowed.

use robotstxt::DefaultMatcher;
use std::collections::HashMap;
use tokio::sync::Mutex;
use url::Url;

/// Parsed robots.txt rules for one host
#[derive(Debug, Clone)]
pub struct ParsedRobots {
    /// Raw robots.txt content (empty means allow all)
    content: String,
}

impl ParsedRobots {
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
        }
    }

    /// Permissive rules, used when robots.txt cannot be fetched
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
        }
    }

    /// Checks if a URL is allowed for the given user agent
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        if self.content.is_empty() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, user_agent, url)
    }
}

/// Per-job cache of robots.txt rules, keyed by scheme://host
pub struct RobotsCache {
    client: reqwest::Client,
    user_agent: String,
    entries: Mutex<HashMap<String, ParsedRobots>>,
}

impl RobotsCache {
    pub fn new(client: reqwest::Client, user_agent: String) -> Self {
        Self {
            client,
            user_agent,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Checks whether a URL may be fetched, consulting the cache first
    pub async fn is_allowed(&self, url: &Url) -> bool {
        let origin = match origin_key(url) {
            Some(origin) => origin,
            None => return true,
        };

        {
            let entries = self.entries.lock().await;
            if let Some(robots) = entries.get(&origin) {
                return robots.is_allowed(url.as_str(), &self.user_agent);
            }
        }

        let robots = self.fetch_robots(&origin).await;
        let allowed = robots.is_allowed(url.as_str(), &self.user_agent);

        let mut entries = self.entries.lock().await;
        entries.insert(origin, robots);
        allowed
    }

    async fn fetch_robots(&self, origin: &str) -> ParsedRobots {
        let robots_url = format!("{}/robots.txt", origin);
        tracing::debug!("Fetching robots.txt: {}", robots_url);

        match self.client.get(&robots_url).send().await {
            Ok(response) if response.status().is_success() => match response.text().await {
                Ok(content) => ParsedRobots::from_content(&content),
                Err(e) => {
                    tracing::debug!("Failed to read robots.txt body from {}: {}", origin, e);
                    ParsedRobots::allow_all()
                }
            },
            Ok(response) => {
                tracing::debug!(
                    "robots.txt at {} returned {}, allowing all",
                    origin,
                    response.status()
                );
                ParsedRobots::allow_all()
            }
            Err(e) => {
                tracing::debug!("Failed to fetch robots.txt from {}: {}", origin, e);
                ParsedRobots::allow_all()
            }
        }
    }
}

fn origin_key(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    match url.port() {
        Some(port) => Some(format!("{}://{}:{}", url.scheme(), host, port)),
        None => Some(format!("{}://{}", url.scheme(), host)),
    }
}
