use async_trait::async_trait;
use tracing::debug;

use super::models::SourceResponse;
use crate::extractor::error::ResolveError;
use crate::extractor::hls_extractor::HlsExtractor;
use crate::extractor::hoster_extractor::{Extractor, ResolveContext};
use crate::manifest::resolve_uri;
use crate::media::{Candidate, MediaStream, SubtitleTrack};

pub const JSON_API_ID: &str = "json-api";

/// Source endpoint of an embed page: the `/embed/` segment becomes
/// `/api/source/`.
pub fn api_url(embed_url: &str) -> Result<String, ResolveError> {
    if embed_url.contains("/embed/") {
        Ok(embed_url.replacen("/embed/", "/api/source/", 1))
    } else {
        Err(ResolveError::InvalidUrl(format!(
            "{embed_url} has no /embed/ segment"
        )))
    }
}

/// Hosters whose embed pages are backed by a JSON endpoint returning an HLS
/// path plus subtitle tracks, e.g. `{"hls": "/m/1/master.m3u8",
/// "subtitles": [{"name": "English", "src": "/s/en.vtt"}]}`.
#[derive(Debug, Default)]
pub struct JsonApiEmbed;

impl JsonApiEmbed {
    pub fn new() -> Self {
        Self
    }
}

impl HlsExtractor for JsonApiEmbed {}

#[async_trait]
impl Extractor for JsonApiEmbed {
    fn id(&self) -> &str {
        JSON_API_ID
    }

    async fn resolve(
        &self,
        candidate: &Candidate,
        ctx: &ResolveContext,
    ) -> Result<Vec<MediaStream>, ResolveError> {
        let api_url = api_url(&candidate.url)?;
        let response = ctx.get(&api_url, &candidate.url).await?;
        let source: SourceResponse = serde_json::from_slice(&response.body)?;
        debug!("{} -> {:?}", api_url, source);

        let hls = source
            .hls
            .filter(|hls| !hls.is_empty())
            .ok_or_else(|| ResolveError::MissingField("hls".to_string()))?;

        let subtitles = source
            .subtitles
            .into_iter()
            .filter(|sub| !sub.src.is_empty())
            .filter_map(|sub| {
                let url = resolve_uri(&candidate.url, &sub.src).ok()?;
                Some(SubtitleTrack::new(url, sub.name))
            })
            .collect();

        self.extract_hls_streams(
            ctx,
            candidate,
            &resolve_uri(&candidate.url, &hls)?,
            &candidate.url,
            subtitles,
        )
        .await
    }
}
