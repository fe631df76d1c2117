use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use rustls::{ClientConfig, crypto::ring};
use rustls_platform_verifier::BuilderVerifierExt;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::embed::EmbedWalker;
use super::error::ResolveError;
use super::hosters::{DirectFile, JsonApiEmbed};
use super::registry::ExtractorRegistry;
use crate::config::HosterConfig;

pub(crate) const DEFAULT_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProxyConfig {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

pub fn default_client() -> Result<Client, ResolveError> {
    create_client(None, DEFAULT_REQUEST_TIMEOUT)
}

pub fn create_client(
    proxy_config: Option<ProxyConfig>,
    timeout: Duration,
) -> Result<Client, ResolveError> {
    let provider = Arc::new(ring::default_provider());
    let tls_config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| ResolveError::ConfigError(format!("TLS protocol versions: {e}")))?
        .with_platform_verifier()
        .map_err(|e| ResolveError::ConfigError(format!("TLS platform verifier: {e}")))?
        .with_no_client_auth();

    let mut builder = Client::builder()
        .use_preconfigured_tls(tls_config)
        .timeout(timeout);

    if let Some(config) = proxy_config {
        match reqwest::Proxy::all(&config.url) {
            Ok(mut proxy) => {
                if let (Some(username), Some(password)) = (config.username, config.password) {
                    proxy = proxy.basic_auth(&username, &password);
                }
                builder = builder.proxy(proxy);
            }
            Err(e) => {
                warn!("Failed to configure proxy '{}': {}", config.url, e);
            }
        }
    }

    Ok(builder.build()?)
}

/// Returns a registry populated with the built-in extractors plus every
/// cipher-backed hoster from `hosters`. Invalid hoster entries are skipped.
pub fn default_registry(hosters: &[HosterConfig]) -> ExtractorRegistry {
    let mut registry = ExtractorRegistry::new(Arc::new(EmbedWalker::generic()));
    registry.register(Arc::new(DirectFile::new()));
    registry.register(Arc::new(JsonApiEmbed::new()));

    for hoster in hosters {
        match EmbedWalker::from_config(hoster) {
            Ok(walker) => registry.register(Arc::new(walker)),
            Err(e) => warn!("Skipping hoster '{}': {}", hoster.id, e),
        }
    }

    registry
}
