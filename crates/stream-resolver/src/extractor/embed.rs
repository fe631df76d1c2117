use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use super::error::ResolveError;
use super::hls_extractor::HlsExtractor;
use super::hoster_extractor::{Extractor, ResolveContext};
use super::page::{self, CipherLayer, MediaSource, PageFinding};
use crate::config::HosterConfig;
use crate::media::{Candidate, MediaKind, MediaStream, SubtitleTrack};

pub const EMBED_ID: &str = "embed";

/// Where a walk ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkOutcome {
    /// Playable URLs found on the last page, at least one.
    pub sources: Vec<MediaSource>,
    /// Last page fetched, or the candidate referer when no page was needed.
    pub page_url: String,
    pub subtitles: Vec<SubtitleTrack>,
}

/// Follows a candidate's chain of embed pages until a playable URL shows up.
///
/// The chain is walked iteratively; at most `max_depth` nested pages are
/// followed after the candidate page itself.
#[derive(Debug, Clone)]
pub struct EmbedWalker {
    id: String,
    url_pattern: Option<Regex>,
    cipher: Option<CipherLayer>,
}

impl EmbedWalker {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self {
            id: id.into(),
            url_pattern: None,
            cipher: None,
        }
    }

    /// Walker without a cipher, registered as the fallback extractor.
    pub fn generic() -> Self {
        Self::new(EMBED_ID)
    }

    pub fn with_url_pattern(mut self, pattern: Regex) -> Self {
        self.url_pattern = Some(pattern);
        self
    }

    pub fn with_cipher(mut self, cipher: CipherLayer) -> Self {
        self.cipher = Some(cipher);
        self
    }

    pub fn from_config(config: &HosterConfig) -> Result<Self, ResolveError> {
        if config.id.trim().is_empty() {
            return Err(ResolveError::ConfigError("hoster id is empty".to_string()));
        }

        let mut cipher = CipherLayer::new(config.profile.clone(), config.secret.clone());
        if let Some(pattern) = &config.payload_pattern {
            cipher = cipher.with_payload_pattern(compile(pattern)?);
        }

        let mut walker = Self::new(config.id.trim()).with_cipher(cipher);
        if let Some(pattern) = &config.url_pattern {
            walker = walker.with_url_pattern(compile(pattern)?);
        }
        Ok(walker)
    }

    pub async fn walk(
        &self,
        candidate: &Candidate,
        ctx: &ResolveContext,
    ) -> Result<WalkOutcome, ResolveError> {
        let mut url = candidate.url.trim().to_string();
        let mut referer = candidate.referer.clone();
        let mut subtitles = Vec::new();
        let mut hops = 0;

        loop {
            if MediaKind::from_url(&url).is_some() {
                return Ok(WalkOutcome {
                    sources: vec![MediaSource::new(url)],
                    page_url: referer,
                    subtitles: page::dedup_subtitles(subtitles),
                });
            }

            let response = ctx.get(&url, &referer).await?;
            let page_url = response.url.clone();
            let inspection = page::inspect(&response.text(), &page_url, self.cipher.as_ref())?;
            subtitles.extend(inspection.subtitles);

            match inspection.finding {
                PageFinding::Media(media_url) => {
                    debug!("[{}] {} -> {}", self.id, page_url, media_url);
                    return Ok(WalkOutcome {
                        sources: vec![MediaSource::new(media_url)],
                        page_url,
                        subtitles: page::dedup_subtitles(subtitles),
                    });
                }
                PageFinding::Sources(sources) => {
                    debug!("[{}] {} -> {} sources", self.id, page_url, sources.len());
                    return Ok(WalkOutcome {
                        sources,
                        page_url,
                        subtitles: page::dedup_subtitles(subtitles),
                    });
                }
                PageFinding::Nested(next) => {
                    if hops >= ctx.max_depth {
                        return Err(ResolveError::ResolutionDepthExceeded(ctx.max_depth));
                    }
                    hops += 1;
                    debug!("[{}] hop {}: {} -> {}", self.id, hops, page_url, next);
                    referer = page_url;
                    url = next;
                }
                PageFinding::Nothing => {
                    return Err(ResolveError::MissingField(format!(
                        "playable source on {page_url}"
                    )));
                }
            }
        }
    }
}

fn compile(pattern: &str) -> Result<Regex, ResolveError> {
    Regex::new(pattern).map_err(|e| ResolveError::ConfigError(format!("bad pattern {pattern:?}: {e}")))
}

impl HlsExtractor for EmbedWalker {}

#[async_trait]
impl Extractor for EmbedWalker {
    fn id(&self) -> &str {
        &self.id
    }

    fn matches_name(&self, name: &str) -> bool {
        self.id != EMBED_ID && name.trim().eq_ignore_ascii_case(&self.id)
    }

    fn matches_url(&self, url: &str) -> bool {
        self.url_pattern
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(url))
    }

    async fn resolve(
        &self,
        candidate: &Candidate,
        ctx: &ResolveContext,
    ) -> Result<Vec<MediaStream>, ResolveError> {
        let outcome = self.walk(candidate, ctx).await?;
        self.build_source_streams(
            ctx,
            candidate,
            &outcome.sources,
            &outcome.page_url,
            outcome.subtitles,
        )
        .await
    }
}
