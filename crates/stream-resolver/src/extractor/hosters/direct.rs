use async_trait::async_trait;

use crate::extractor::error::ResolveError;
use crate::extractor::hls_extractor::HlsExtractor;
use crate::extractor::hoster_extractor::{Extractor, ResolveContext};
use crate::media::{Candidate, MediaKind, MediaStream};

pub const DIRECT_ID: &str = "direct";

/// Candidates whose URL already is a manifest or media file.
#[derive(Debug, Default)]
pub struct DirectFile;

impl DirectFile {
    pub fn new() -> Self {
        Self
    }
}

impl HlsExtractor for DirectFile {}

#[async_trait]
impl Extractor for DirectFile {
    fn id(&self) -> &str {
        DIRECT_ID
    }

    fn matches_url(&self, url: &str) -> bool {
        MediaKind::from_url(url).is_some()
    }

    async fn resolve(
        &self,
        candidate: &Candidate,
        ctx: &ResolveContext,
    ) -> Result<Vec<MediaStream>, ResolveError> {
        if candidate.url.trim().is_empty() {
            return Err(ResolveError::InvalidUrl("empty url".to_string()));
        }
        self.build_streams(
            ctx,
            candidate,
            candidate.url.trim(),
            &candidate.referer,
            Vec::new(),
        )
        .await
    }
}
