use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::aggregator::DEFAULT_MAX_CONCURRENCY;
use crate::cipher::{CipherProfile, CipherSecret};
use crate::extractor::DEFAULT_REQUEST_TIMEOUT;
use crate::extractor::ProxyConfig;
use crate::extractor::hoster_extractor::DEFAULT_MAX_DEPTH;

/// A cipher-backed embed hoster declared in configuration.
///
/// ```toml
/// [[hosters]]
/// id = "vidsrc"
/// url_pattern = '^https://vidsrc\.example/e/'
/// password = "passphrase"
/// profile = { kind = "salted-prefix", digest = "md5", key_bits = 256 }
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct HosterConfig {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_pattern: Option<String>,
    #[serde(default)]
    pub profile: CipherProfile,
    #[serde(flatten)]
    pub secret: CipherSecret,
    /// Regex locating payloads; group 1 when present, the whole match
    /// otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload_pattern: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ResolverConfig {
    /// Nested embed pages followed per candidate.
    pub max_depth: usize,
    /// Candidates resolved at once.
    pub max_concurrency: usize,
    /// Per request, in seconds.
    pub request_timeout: u64,
    pub max_in_flight_requests: Option<usize>,
    pub user_agent: Option<String>,
    pub proxy: Option<ProxyConfig>,
    pub hosters: Vec<HosterConfig>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT.as_secs(),
            max_in_flight_requests: None,
            user_agent: None,
            proxy: None,
            hosters: Vec::new(),
        }
    }
}

impl ResolverConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout.max(1))
    }
}
