use std::sync::Arc;

use tracing::debug;

use super::error::ResolveError;
use super::hoster_extractor::ResolveContext;
use super::registry::ExtractorRegistry;
use crate::media::{Candidate, MediaStream};

/// Resolves one candidate through the extractor its hoster maps to.
#[derive(Clone)]
pub struct EmbedResolver {
    registry: Arc<ExtractorRegistry>,
    ctx: ResolveContext,
}

impl EmbedResolver {
    pub fn new(registry: Arc<ExtractorRegistry>, ctx: ResolveContext) -> Self {
        Self { registry, ctx }
    }

    pub fn registry(&self) -> &ExtractorRegistry {
        &self.registry
    }

    pub fn context(&self) -> &ResolveContext {
        &self.ctx
    }

    /// Streams of `candidate`; never `Ok` with an empty list.
    pub async fn resolve(&self, candidate: &Candidate) -> Result<Vec<MediaStream>, ResolveError> {
        if candidate.url.trim().is_empty() {
            return Err(ResolveError::InvalidUrl(format!(
                "candidate '{}' has no url",
                candidate.name
            )));
        }

        let extractor = self.registry.lookup(candidate)?;
        debug!("Resolving '{}' with {}", candidate.name, extractor.id());

        let streams: Vec<MediaStream> = extractor
            .resolve(candidate, &self.ctx)
            .await?
            .into_iter()
            .filter(|stream| !stream.url.is_empty())
            .collect();

        if streams.is_empty() {
            return Err(ResolveError::NoStreamsFound);
        }
        Ok(streams)
    }
}
