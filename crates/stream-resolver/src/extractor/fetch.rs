use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use rustc_hash::FxHashMap;
use tokio::sync::Semaphore;
use tracing::debug;

use super::default::DEFAULT_UA;
use super::error::ResolveError;

/// A fetched response. `url` is the final URL after redirects.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub url: String,
    pub headers: FxHashMap<String, String>,
    pub body: Bytes,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn error_for_status(self) -> Result<Self, ResolveError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ResolveError::HttpStatus {
                status: self.status,
                url: self.url,
            })
        }
    }
}

/// The HTTP capability the engine runs on. Implementations own throttling,
/// TLS and redirect handling.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(
        &self,
        url: &str,
        headers: &FxHashMap<String, String>,
    ) -> Result<FetchResponse, ResolveError>;
}

/// [`Fetcher`] backed by a shared `reqwest` client.
///
/// Browser-like default headers are sent with every request, and the number
/// of requests in flight can be bounded to respect hoster rate limits.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    default_headers: HeaderMap,
    in_flight: Option<Arc<Semaphore>>,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            reqwest::header::USER_AGENT,
            HeaderValue::from_static(DEFAULT_UA),
        );
        default_headers.insert(
            reqwest::header::ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        default_headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            HeaderValue::from_static("en-US,en;q=0.8"),
        );

        Self {
            client,
            default_headers,
            in_flight: None,
        }
    }

    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        match HeaderValue::from_str(user_agent) {
            Ok(value) => {
                self.default_headers
                    .insert(reqwest::header::USER_AGENT, value);
            }
            Err(e) => debug!("Ignoring invalid user agent {:?}: {}", user_agent, e),
        }
        self
    }

    /// Caps concurrent requests across every candidate sharing this fetcher.
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.in_flight = Some(Arc::new(Semaphore::new(max_in_flight.max(1))));
        self
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    fn build_headers(&self, headers: &FxHashMap<String, String>) -> HeaderMap {
        let mut merged = self.default_headers.clone();
        for (key, value) in headers {
            if value.is_empty() {
                continue;
            }
            match (
                HeaderName::from_bytes(key.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    merged.insert(name, value);
                }
                _ => debug!("Skipping invalid header {}: {}", key, value),
            }
        }
        merged
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(
        &self,
        url: &str,
        headers: &FxHashMap<String, String>,
    ) -> Result<FetchResponse, ResolveError> {
        let _permit = match &self.in_flight {
            Some(semaphore) => Some(
                semaphore
                    .acquire()
                    .await
                    .map_err(|e| ResolveError::ConfigError(e.to_string()))?,
            ),
            None => None,
        };

        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .headers(self.build_headers(headers))
            .send()
            .await?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let response_headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
            .collect();
        let body = response.bytes().await?;

        Ok(FetchResponse {
            status,
            url: final_url,
            headers: response_headers,
            body,
        })
    }
}
