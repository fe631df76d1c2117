use std::sync::Arc;
use std::time::Duration;

use crate::aggregator::SourceAggregator;
use crate::config::ResolverConfig;
use crate::extractor::{
    EmbedResolver, Extractor, ExtractorRegistry, Fetcher, HttpFetcher, ResolveContext,
    ResolveError, create_client, default_registry,
};
use crate::media::{Candidate, MediaStream, Preference};
use crate::ranker;

/// Entry point: resolves every candidate of a title and ranks the result.
#[derive(Clone)]
pub struct StreamResolver {
    aggregator: SourceAggregator,
    resolver: EmbedResolver,
}

impl StreamResolver {
    pub fn builder() -> StreamResolverBuilder {
        StreamResolverBuilder::default()
    }

    pub fn from_config(config: ResolverConfig) -> Result<Self, ResolveError> {
        Self::builder().config(config).build()
    }

    /// Aggregates all `candidates` and orders the streams by `pref`.
    ///
    /// Only [`ResolveError::AllSourcesFailed`] and
    /// [`ResolveError::DeadlineExceeded`] are returned; failures of single
    /// candidates are logged and skipped.
    pub async fn resolve_best_streams(
        &self,
        candidates: &[Candidate],
        pref: &Preference,
        deadline: Option<Duration>,
    ) -> Result<Vec<MediaStream>, ResolveError> {
        let streams = self.aggregator.aggregate(candidates, deadline).await?;
        Ok(ranker::rank(streams, pref))
    }

    /// Streams of a single candidate, errors included.
    pub async fn resolve_candidate(
        &self,
        candidate: &Candidate,
    ) -> Result<Vec<MediaStream>, ResolveError> {
        self.resolver.resolve(candidate).await
    }

    pub fn registry(&self) -> &ExtractorRegistry {
        self.resolver.registry()
    }
}

#[derive(Default)]
pub struct StreamResolverBuilder {
    config: ResolverConfig,
    fetcher: Option<Arc<dyn Fetcher>>,
    registry: Option<ExtractorRegistry>,
    extractors: Vec<Arc<dyn Extractor>>,
}

impl StreamResolverBuilder {
    pub fn config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.config.max_depth = max_depth;
        self
    }

    pub fn max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.config.max_concurrency = max_concurrency;
        self
    }

    /// Replaces the HTTP fetcher otherwise built from the configuration.
    pub fn fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Replaces the default registry; configured hosters are then ignored.
    pub fn registry(mut self, registry: ExtractorRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn extractor(mut self, extractor: Arc<dyn Extractor>) -> Self {
        self.extractors.push(extractor);
        self
    }

    pub fn build(self) -> Result<StreamResolver, ResolveError> {
        let config = self.config;

        let fetcher = match self.fetcher {
            Some(fetcher) => fetcher,
            None => {
                let client = create_client(config.proxy.clone(), config.request_timeout())?;
                let mut fetcher = HttpFetcher::new(client);
                if let Some(user_agent) = &config.user_agent {
                    fetcher = fetcher.with_user_agent(user_agent);
                }
                if let Some(max_in_flight) = config.max_in_flight_requests {
                    fetcher = fetcher.with_max_in_flight(max_in_flight);
                }
                Arc::new(fetcher)
            }
        };

        let mut registry = self
            .registry
            .unwrap_or_else(|| default_registry(&config.hosters));
        for extractor in self.extractors {
            registry.register(extractor);
        }

        let ctx = ResolveContext::new(fetcher).with_max_depth(config.max_depth);
        let resolver = EmbedResolver::new(Arc::new(registry), ctx);
        let aggregator =
            SourceAggregator::new(resolver.clone()).with_max_concurrency(config.max_concurrency);

        Ok(StreamResolver {
            aggregator,
            resolver,
        })
    }
}
