//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients (one per proxy URL) without built-in retries
//! - Browser-like request headers with User-Agent rotation
//! - The randomized pre-request delay
//! - Classifying responses into retryable and final failures

use super::pacing::{DelayRange, Randomness, Sleeper, PRE_REQUEST_DELAY};
use crate::FetchError;
use async_trait::async_trait;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, CACHE_CONTROL, PRAGMA, UPGRADE_INSECURE_REQUESTS,
    USER_AGENT,
};
use reqwest::{redirect::Policy, Client, Proxy, StatusCode};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Desktop browser User-Agents rotated across requests
pub const USER_AGENTS: [&str; 5] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
];

const BROWSER_HEADERS: [(&str, &str); 9] = [
    (
        "accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8",
    ),
    ("accept-language", "en-US,en;q=0.9"),
    ("sec-ch-ua", "\"Not_A Brand\";v=\"8\", \"Chromium\";v=\"120\", \"Google Chrome\";v=\"120\""),
    ("sec-ch-ua-mobile", "?0"),
    ("sec-ch-ua-platform", "\"Windows\""),
    ("sec-fetch-dest", "document"),
    ("sec-fetch-mode", "navigate"),
    ("sec-fetch-site", "none"),
    ("sec-fetch-user", "?1"),
];

/// Builds the request header set for one attempt
///
/// Accept-Encoding is left to the client so compressed bodies are decoded.
pub fn stealth_headers(rng: &dyn Randomness) -> HeaderMap {
    let mut headers = HeaderMap::new();

    let agent = USER_AGENTS[rng.index(USER_AGENTS.len())];
    headers.insert(USER_AGENT, HeaderValue::from_static(agent));

    for (name, value) in BROWSER_HEADERS {
        headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
    }
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));

    headers
}

/// Result of a single GET
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Status below 400; body read completely
    Success {
        /// HTTP status code
        status_code: u16,
        /// Page body content
        body: String,
    },

    /// Status 400 or above
    HttpError {
        /// The HTTP status code
        status_code: u16,
    },

    /// Transport failure (timeout, connect, DNS, body read)
    NetworkError {
        /// Error description
        error: String,
    },
}

impl FetchOutcome {
    /// Converts the outcome into the body or a classified [`FetchError`]
    pub fn into_result(self, url: &str) -> Result<String, FetchError> {
        match self {
            Self::Success { body, .. } => Ok(body),
            Self::HttpError { status_code } if status_code == StatusCode::NOT_FOUND.as_u16() => {
                Err(FetchError::NotFound {
                    url: url.to_string(),
                })
            }
            Self::HttpError { status_code } => Err(FetchError::Status {
                url: url.to_string(),
                status_code,
            }),
            Self::NetworkError { error } => Err(FetchError::Network {
                url: url.to_string(),
                message: error,
            }),
        }
    }
}

/// Builds an HTTP client, optionally routed through a proxy
///
/// # Arguments
///
/// * `proxy_url` - Proxy for all schemes, or `None` for a direct connection
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(FetchError::Client)` - Invalid proxy URL or TLS backend failure
///
/// # Example
///
/// ```no_run
/// use listing_sweep::crawler::build_http_client;
///
/// let direct = build_http_client(None).unwrap();
/// let proxied = build_http_client(Some("http://proxy.local:8000")).unwrap();
/// ```
pub fn build_http_client(proxy_url: Option<&str>) -> Result<Client, FetchError> {
    let mut builder = Client::builder()
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true);

    if let Some(proxy_url) = proxy_url {
        let proxy = Proxy::all(proxy_url)
            .map_err(|e| FetchError::Client(format!("invalid proxy '{}': {}", proxy_url, e)))?;
        builder = builder.proxy(proxy);
    }

    builder.build().map_err(|e| FetchError::Client(e.to_string()))
}

/// Sends one GET with the given headers and classifies the response
pub async fn fetch_url(client: &Client, url: &str, headers: HeaderMap) -> FetchOutcome {
    match client.get(url).headers(headers).send().await {
        Ok(response) => {
            let status = response.status();

            if status.as_u16() >= 400 {
                return FetchOutcome::HttpError {
                    status_code: status.as_u16(),
                };
            }

            match response.text().await {
                Ok(body) => FetchOutcome::Success {
                    status_code: status.as_u16(),
                    body,
                },
                Err(e) => FetchOutcome::NetworkError {
                    error: format!("Failed to read body: {}", e),
                },
            }
        }
        Err(e) => {
            // Classify error
            if e.is_timeout() {
                FetchOutcome::NetworkError {
                    error: "Request timeout".to_string(),
                }
            } else if e.is_connect() {
                FetchOutcome::NetworkError {
                    error: format!("Connection failed: {}", e),
                }
            } else if e.is_redirect() {
                FetchOutcome::NetworkError {
                    error: format!("Redirect error: {}", e),
                }
            } else {
                FetchOutcome::NetworkError {
                    error: e.to_string(),
                }
            }
        }
    }
}

/// One fetch attempt for a page
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str, proxy_url: Option<&str>) -> Result<String, FetchError>;
}

/// [`PageFetcher`] backed by reqwest
pub struct HttpFetcher {
    clients: Mutex<HashMap<Option<String>, Client>>,
    sleeper: Arc<dyn Sleeper>,
    rng: Arc<dyn Randomness>,
    pre_request_delay: DelayRange,
}

impl HttpFetcher {
    pub fn new(sleeper: Arc<dyn Sleeper>, rng: Arc<dyn Randomness>) -> Self {
        Self {
            clients: Mutex::new(HashMap::new()),
            sleeper,
            rng,
            pre_request_delay: PRE_REQUEST_DELAY,
        }
    }

    /// Replaces the pre-request delay window
    pub fn with_pre_request_delay(mut self, delay: DelayRange) -> Self {
        self.pre_request_delay = delay;
        self
    }

    fn client_for(&self, proxy_url: Option<&str>) -> Result<Client, FetchError> {
        let mut clients = self
            .clients
            .lock()
            .map_err(|e| FetchError::Client(format!("Failed to lock client cache: {}", e)))?;

        let key = proxy_url.map(str::to_string);
        if let Some(client) = clients.get(&key) {
            return Ok(client.clone());
        }

        let client = build_http_client(proxy_url)?;
        clients.insert(key, client.clone());
        Ok(client)
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, proxy_url: Option<&str>) -> Result<String, FetchError> {
        let client = self.client_for(proxy_url)?;

        let delay = self.pre_request_delay.sample(self.rng.as_ref());
        tracing::trace!("Waiting {:?} before requesting {}", delay, url);
        self.sleeper.sleep(delay).await;

        let headers = stealth_headers(self.rng.as_ref());
        let outcome = fetch_url(&client, url, headers).await;

        if let FetchOutcome::Success { status_code, body } = &outcome {
            tracing::debug!("Fetched {} ({}, {} bytes)", url, status_code, body.len());
        }

        outcome.into_result(url)
    }
}
