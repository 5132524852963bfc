//! HTTP fetching
//!
//! Builds the shared client and performs single-page fetches. Redirects are
//! followed manually so the full chain ends up in the record; any HTTP
//! status is a successful fetch (the status is data, not an error). Only
//! transport problems — timeouts, connection failures, redirect loops —
//! count as fetch failures, and those are reported as text for the record's
//! `errors` column, never retried.

use crate::config::EngineSettings;
use reqwest::{redirect::Policy, Client, StatusCode};
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};
use url::Url;

/// A fetched page with its response metadata
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub url: Url,

    /// HTTP status of the final response
    pub status: u16,

    /// Response body
    pub body: String,

    /// Response headers of the final response
    pub resp_headers: Vec<(String, String)>,

    /// Headers sent with the request
    pub request_headers: Vec<(String, String)>,

    /// URLs left behind by redirects, requested-first
    pub redirect_urls: Vec<String>,

    /// Status codes that caused each redirect
    pub redirect_reasons: Vec<u16>,

    /// Seconds from dispatch to body received
    pub download_latency: f64,

    /// Remote peer address, when known
    pub remote_addr: Option<String>,
}

/// Outcome of one fetch attempt
#[derive(Debug)]
pub enum FetchOutcome {
    /// Got a response (any status code)
    Page(Box<FetchedPage>),

    /// Transport-level failure; message goes into the errors column
    Failed { message: String },
}

/// Builds the HTTP client shared by all workers
pub fn build_http_client(settings: &EngineSettings) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(settings.user_agent.clone())
        .timeout(settings.download_timeout())
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::none()) // Chain is followed manually
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL, following redirects manually
///
/// `extra_headers` are per-URL request headers from the job's meta; they
/// are sent on every hop of the chain.
pub async fn fetch_url(
    client: &Client,
    url: &Url,
    settings: &EngineSettings,
    extra_headers: Option<&HashMap<String, String>>,
) -> FetchOutcome {
    let mut current = url.clone();
    let mut chain_seen: HashSet<String> = HashSet::new();
    chain_seen.insert(current.to_string());
    let mut redirect_urls: Vec<String> = Vec::new();
    let mut redirect_reasons: Vec<u16> = Vec::new();
    let start = Instant::now();

    let request_headers = sent_headers(settings, extra_headers);

    loop {
        let mut request = client.get(current.clone());
        for (name, value) in &settings.default_request_headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(extra) = extra_headers {
            for (name, value) in extra {
                request = request.header(name.as_str(), value.as_str());
            }
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => return FetchOutcome::Failed { message: classify_error(&e) },
        };

        let status = response.status();
        if status.is_redirection() {
            let location = response
                .headers()
                .get(reqwest::header::LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);

            if let Some(location) = location {
                if redirect_urls.len() as u32 >= settings.redirect_max_times {
                    return FetchOutcome::Failed {
                        message: format!(
                            "redirect limit of {} exceeded at {}",
                            settings.redirect_max_times, current
                        ),
                    };
                }

                let next = match current.join(&location) {
                    Ok(next) => next,
                    Err(e) => {
                        return FetchOutcome::Failed {
                            message: format!("invalid redirect location '{}': {}", location, e),
                        }
                    }
                };

                if !chain_seen.insert(next.to_string()) || next == current {
                    return FetchOutcome::Failed {
                        message: format!("redirect loop detected at {}", next),
                    };
                }

                redirect_urls.push(current.to_string());
                redirect_reasons.push(status.as_u16());
                tracing::debug!("Redirect {} -> {} ({})", current, next, status.as_u16());
                current = next;
                continue;
            }
            // A redirect status without a Location header is just a response
        }

        return finish_response(
            response,
            status,
            request_headers,
            redirect_urls,
            redirect_reasons,
            start,
        )
        .await;
    }
}

async fn finish_response(
    response: reqwest::Response,
    status: StatusCode,
    request_headers: Vec<(String, String)>,
    redirect_urls: Vec<String>,
    redirect_reasons: Vec<u16>,
    start: Instant,
) -> FetchOutcome {
    let final_url = response.url().clone();
    let remote_addr = response.remote_addr().map(|addr| addr.ip().to_string());

    let resp_headers: Vec<(String, String)> = response
        .headers()
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();

    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => {
            return FetchOutcome::Failed {
                message: format!("failed to read response body: {}", classify_error(&e)),
            }
        }
    };

    FetchOutcome::Page(Box::new(FetchedPage {
        url: final_url,
        status: status.as_u16(),
        body,
        resp_headers,
        request_headers,
        redirect_urls,
        redirect_reasons,
        download_latency: start.elapsed().as_secs_f64(),
        remote_addr,
    }))
}

/// The headers this client will send, for the record's request_headers_*
fn sent_headers(
    settings: &EngineSettings,
    extra_headers: Option<&HashMap<String, String>>,
) -> Vec<(String, String)> {
    let mut headers: Vec<(String, String)> = Vec::new();
    headers.push(("user-agent".to_string(), settings.user_agent.clone()));
    headers.push(("accept-encoding".to_string(), "gzip, br".to_string()));
    for (name, value) in &settings.default_request_headers {
        headers.push((name.to_lowercase(), value.clone()));
    }
    if let Some(extra) = extra_headers {
        let mut names: Vec<&String> = extra.keys().collect();
        names.sort();
        for name in names {
            headers.push((name.to_lowercase(), extra[name].clone()));
        }
    }
    headers
}

fn classify_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "request timed out".to_string()
    } else if e.is_connect() {
        format!("connection failed: {}", e)
    } else {
        e.to_string()
    }
}
