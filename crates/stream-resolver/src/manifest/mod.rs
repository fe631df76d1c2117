//! Lenient HLS master playlist parsing.
//!
//! Hoster manifests are frequently off-spec (missing `#EXTM3U`, stray
//! whitespace, `NAME` instead of `RESOLUTION`), so variants are extracted by
//! scanning `#EXT-X-STREAM-INF` entries rather than by a strict grammar.

use std::sync::LazyLock;

use m3u8_rs::Playlist;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

/// Tag introducing a variant in a master playlist.
pub const STREAM_INF_TAG: &str = "#EXT-X-STREAM-INF:";

static RESOLUTION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"RESOLUTION=(\d+)x(\d+)").unwrap());
static NAME_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"NAME="([^"]*)""#).unwrap());
static BANDWIDTH_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[^-])BANDWIDTH=(\d+)").unwrap());

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct VariantStream {
    pub uri: String,
    // "<height>p", or the NAME attribute when no resolution is given
    pub resolution_label: String,
    pub bandwidth: Option<u64>,
}

/// Parses a master playlist into its variants, in manifest order.
///
/// Relative URIs are resolved against `base_url`. Entries without a URI line,
/// or whose URI does not resolve, are skipped. An empty manifest yields no
/// variants.
pub fn parse(manifest_text: &str, base_url: &str) -> Vec<VariantStream> {
    let mut variants = Vec::new();

    for segment in manifest_text.split(STREAM_INF_TAG).skip(1) {
        let mut lines = segment.lines();
        let attributes = lines.next().unwrap_or_default();

        let uri = lines
            .map(str::trim)
            .find(|line| !line.is_empty() && !line.starts_with('#'));
        let Some(uri) = uri else {
            continue;
        };

        let resolution_label = RESOLUTION_REGEX
            .captures(attributes)
            .and_then(|c| c.get(2))
            .map(|height| format!("{}p", height.as_str()))
            .or_else(|| {
                NAME_REGEX
                    .captures(attributes)
                    .and_then(|c| c.get(1))
                    .map(|name| name.as_str().to_string())
            })
            .unwrap_or_default();

        let bandwidth = BANDWIDTH_REGEX
            .captures(attributes)
            .and_then(|c| c.get(1))
            .and_then(|bw| bw.as_str().parse().ok());

        let uri = match resolve_uri(base_url, uri) {
            Ok(uri) => uri,
            Err(e) => {
                debug!("skipping variant {:?}: {}", uri, e);
                continue;
            }
        };

        variants.push(VariantStream {
            uri,
            resolution_label,
            bandwidth,
        });
    }

    variants
}

/// Resolves `uri` against `base_url`.
///
/// Absolute URIs are returned as parsed; relative ones replace the last path
/// segment of the base, including `..` and `.` segments.
pub fn resolve_uri(base_url: &str, uri: &str) -> Result<String, url::ParseError> {
    let resolved = match Url::parse(uri) {
        Ok(absolute) => absolute,
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(base_url)?.join(uri)?,
        Err(e) => return Err(e),
    };
    Ok(resolved.into())
}

pub fn is_master_playlist(text: &str) -> bool {
    text.contains(STREAM_INF_TAG)
}

/// True for a playable media playlist, i.e. one listing segments directly.
pub fn is_media_playlist(text: &str) -> bool {
    matches!(
        m3u8_rs::parse_playlist_res(text.as_bytes()),
        Ok(Playlist::MediaPlaylist(pl)) if !pl.segments.is_empty()
    )
}
