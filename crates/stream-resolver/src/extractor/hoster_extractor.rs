use std::sync::Arc;

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use tracing::debug;

use super::error::ResolveError;
use super::fetch::{FetchResponse, Fetcher};
use crate::media::{Candidate, MediaStream};

pub const REFERER: &str = "Referer";
pub const ORIGIN: &str = "Origin";

/// Default cap on nested embed pages followed for one candidate.
pub const DEFAULT_MAX_DEPTH: usize = 3;

/// Shared, read-only state handed to every extractor invocation.
#[derive(Clone)]
pub struct ResolveContext {
    fetcher: Arc<dyn Fetcher>,
    pub max_depth: usize,
}

impl ResolveContext {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn fetcher(&self) -> &Arc<dyn Fetcher> {
        &self.fetcher
    }

    /// GET `url` with a `Referer` header (omitted when empty), failing on
    /// non-success statuses.
    pub async fn get(&self, url: &str, referer: &str) -> Result<FetchResponse, ResolveError> {
        let mut headers = FxHashMap::default();
        if !referer.is_empty() {
            headers.insert(REFERER.to_string(), referer.to_string());
        }
        self.get_with_headers(url, &headers).await
    }

    pub async fn get_with_headers(
        &self,
        url: &str,
        headers: &FxHashMap<String, String>,
    ) -> Result<FetchResponse, ResolveError> {
        if url.is_empty() {
            return Err(ResolveError::InvalidUrl("empty url".to_string()));
        }
        let response = self.fetcher.fetch(url, headers).await?;
        debug!("{} -> {} ({} bytes)", url, response.status, response.body.len());
        response.error_for_status()
    }

    pub async fn get_text(&self, url: &str, referer: &str) -> Result<String, ResolveError> {
        Ok(self.get(url, referer).await?.text())
    }
}

/// `Referer`/`Origin` pair for the origin of `url`, e.g. `https://cdn.example`.
pub fn origin_headers(url: &str) -> Result<FxHashMap<String, String>, ResolveError> {
    let parsed = url::Url::parse(url)?;
    let origin = parsed.origin().ascii_serialization();
    let mut headers = FxHashMap::default();
    headers.insert(REFERER.to_string(), format!("{origin}/"));
    headers.insert(ORIGIN.to_string(), origin);
    Ok(headers)
}

/// A hoster specific way of turning a candidate into streams.
///
/// Extractors are registered once in an
/// [`ExtractorRegistry`](super::registry::ExtractorRegistry) and shared by all
/// resolutions, so they must not keep per-candidate state.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Registry identifier, compared case-insensitively.
    fn id(&self) -> &str;

    /// Whether candidates whose server `name` is `name` belong to this
    /// extractor. Generic extractors claim no names.
    fn matches_name(&self, _name: &str) -> bool {
        false
    }

    /// Whether this extractor claims candidates by URL when neither the
    /// `hoster` nor the `name` of the candidate selects an extractor.
    fn matches_url(&self, _url: &str) -> bool {
        false
    }

    async fn resolve(
        &self,
        candidate: &Candidate,
        ctx: &ResolveContext,
    ) -> Result<Vec<MediaStream>, ResolveError>;
}
