use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::debug;

use super::error::ResolveError;
use super::hoster_extractor::Extractor;
use crate::media::Candidate;

/// Hoster id to extractor table, populated once at startup.
pub struct ExtractorRegistry {
    extractors: Vec<Arc<dyn Extractor>>,
    by_id: FxHashMap<String, usize>,
    fallback: Arc<dyn Extractor>,
}

impl ExtractorRegistry {
    /// `fallback` handles candidates nothing else claims; it is also
    /// reachable under its own id.
    pub fn new(fallback: Arc<dyn Extractor>) -> Self {
        let mut registry = Self {
            extractors: Vec::new(),
            by_id: FxHashMap::default(),
            fallback: fallback.clone(),
        };
        registry.register(fallback);
        registry
    }

    /// Adds `extractor`, replacing any previous one with the same id.
    pub fn register(&mut self, extractor: Arc<dyn Extractor>) {
        let key = extractor.id().to_lowercase();
        match self.by_id.get(&key) {
            Some(&idx) => {
                debug!("Replacing extractor '{}'", key);
                self.extractors[idx] = extractor;
            }
            None => {
                self.by_id.insert(key, self.extractors.len());
                self.extractors.push(extractor);
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn Extractor>> {
        self.by_id
            .get(&id.trim().to_lowercase())
            .map(|&idx| self.extractors[idx].clone())
    }

    /// Picks the extractor for `candidate`.
    ///
    /// An explicit `hoster` must name a registered id. Otherwise the first
    /// extractor claiming the candidate name wins, then the first claiming
    /// the URL, in registration order, then the fallback. Built-in ids such
    /// as `direct` are never matched against the name.
    pub fn lookup(&self, candidate: &Candidate) -> Result<Arc<dyn Extractor>, ResolveError> {
        if let Some(hoster) = candidate.hoster.as_deref().filter(|h| !h.trim().is_empty()) {
            return self
                .get(hoster)
                .ok_or_else(|| ResolveError::UnsupportedHoster(hoster.to_string()));
        }

        Ok(self
            .extractors
            .iter()
            .find(|extractor| extractor.matches_name(&candidate.name))
            .or_else(|| {
                self.extractors
                    .iter()
                    .find(|extractor| extractor.matches_url(&candidate.url))
            })
            .cloned()
            .unwrap_or_else(|| self.fallback.clone()))
    }

    /// Registered ids in registration order.
    pub fn ids(&self) -> Vec<&str> {
        self.extractors.iter().map(|e| e.id()).collect()
    }

    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }
}
