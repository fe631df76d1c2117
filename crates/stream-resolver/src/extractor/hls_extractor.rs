use async_trait::async_trait;
use rustc_hash::FxHashMap;
use tracing::debug;

use super::error::ResolveError;
use super::hoster_extractor::{REFERER, ResolveContext, origin_headers};
use super::page::MediaSource;
use crate::manifest::{self, VariantStream};
use crate::media::{Candidate, MediaKind, MediaStream, SubtitleTrack};

/// Quality label of the single stream emitted for a media playlist.
pub const SOURCE_QUALITY: &str = "Source";

/// Turns a located media URL into the streams of one candidate.
///
/// `page_url` is the page the URL was found on; it is sent as `Referer` when
/// fetching the manifest and recorded on every stream.
#[async_trait]
pub trait HlsExtractor: Send + Sync {
    async fn build_streams(
        &self,
        ctx: &ResolveContext,
        candidate: &Candidate,
        media_url: &str,
        page_url: &str,
        subtitles: Vec<SubtitleTrack>,
    ) -> Result<Vec<MediaStream>, ResolveError> {
        if MediaKind::from_url(media_url).is_some_and(|kind| kind.is_manifest()) {
            self.extract_hls_streams(ctx, candidate, media_url, page_url, subtitles)
                .await
        } else {
            Ok(vec![direct_stream(candidate, media_url, None, page_url, subtitles)])
        }
    }

    /// Streams of every entry in `sources`. Labels of file entries become the
    /// stream quality; manifests label their variants themselves.
    async fn build_source_streams(
        &self,
        ctx: &ResolveContext,
        candidate: &Candidate,
        sources: &[MediaSource],
        page_url: &str,
        subtitles: Vec<SubtitleTrack>,
    ) -> Result<Vec<MediaStream>, ResolveError> {
        let mut streams = Vec::new();
        for source in sources {
            if MediaKind::from_url(&source.url).is_some_and(|kind| kind.is_manifest()) {
                streams.extend(
                    self.extract_hls_streams(ctx, candidate, &source.url, page_url, subtitles.clone())
                        .await?,
                );
            } else {
                streams.push(direct_stream(
                    candidate,
                    &source.url,
                    source.label.as_deref(),
                    page_url,
                    subtitles.clone(),
                ));
            }
        }
        Ok(streams)
    }

    async fn extract_hls_streams(
        &self,
        ctx: &ResolveContext,
        candidate: &Candidate,
        manifest_url: &str,
        page_url: &str,
        subtitles: Vec<SubtitleTrack>,
    ) -> Result<Vec<MediaStream>, ResolveError> {
        let response = ctx.get(manifest_url, page_url).await?;
        let text = response.text();
        let headers = origin_headers(&response.url)?;

        let variants = manifest::parse(&text, &response.url);
        if variants.is_empty() {
            if manifest::is_media_playlist(&text) {
                debug!("{} is a media playlist", manifest_url);
                let stream = MediaStream {
                    request_headers: headers,
                    subtitles,
                    ..MediaStream::new(
                        manifest_url,
                        candidate.stream_label(Some(SOURCE_QUALITY)),
                        page_url,
                    )
                };
                return Ok(vec![stream]);
            }
            return Err(ResolveError::ManifestParseError(format!(
                "{manifest_url} has no variant streams"
            )));
        }

        let labels = quality_labels(&variants);
        Ok(variants
            .into_iter()
            .zip(labels)
            .map(|(variant, quality)| MediaStream {
                request_headers: headers.clone(),
                subtitles: subtitles.clone(),
                ..MediaStream::new(
                    variant.uri,
                    candidate.stream_label(Some(quality.as_str())),
                    page_url,
                )
            })
            .collect())
    }
}

/// One stream for a playable file URL.
pub fn direct_stream(
    candidate: &Candidate,
    url: &str,
    quality: Option<&str>,
    page_url: &str,
    subtitles: Vec<SubtitleTrack>,
) -> MediaStream {
    let mut stream =
        MediaStream::new(url, candidate.stream_label(quality), page_url).with_subtitles(subtitles);
    if !page_url.is_empty() {
        stream = stream.with_header(REFERER, page_url);
    }
    stream
}

fn kbps(bandwidth: u64) -> String {
    format!("{} kbps", bandwidth / 1000)
}

/// Quality labels for `variants`, distinct from each other.
///
/// Duplicates get the variant bandwidth appended, then an ordinal.
pub fn quality_labels(variants: &[VariantStream]) -> Vec<String> {
    let base: Vec<String> = variants
        .iter()
        .enumerate()
        .map(|(idx, variant)| {
            if !variant.resolution_label.is_empty() {
                variant.resolution_label.clone()
            } else if let Some(bandwidth) = variant.bandwidth {
                kbps(bandwidth)
            } else {
                format!("Variant {}", idx + 1)
            }
        })
        .collect();

    let mut counts: FxHashMap<&str, usize> = FxHashMap::default();
    for label in &base {
        *counts.entry(label.as_str()).or_default() += 1;
    }

    let mut labels: Vec<String> = base
        .iter()
        .zip(variants)
        .map(|(label, variant)| match variant.bandwidth {
            Some(bandwidth) if counts[label.as_str()] > 1 && !label.ends_with(" kbps") => {
                format!("{label} ({})", kbps(bandwidth))
            }
            _ => label.clone(),
        })
        .collect();

    let mut seen: FxHashMap<String, usize> = FxHashMap::default();
    for label in labels.iter_mut() {
        let n = seen.entry(label.clone()).or_default();
        *n += 1;
        if *n > 1 {
            *label = format!("{label} #{n}");
        }
    }

    labels
}
