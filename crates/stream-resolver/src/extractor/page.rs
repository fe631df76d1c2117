//! Inspection of a single embed page body.
//!
//! A page is searched, in priority order, for a playable file reference, for
//! obfuscated payloads (cipher payloads and `atob` layers, which are unwrapped
//! and searched again) and finally for a nested embed URL.

use std::borrow::Cow;
use std::sync::LazyLock;

use base64::{
    Engine,
    engine::general_purpose::{STANDARD, STANDARD_NO_PAD},
};
use regex::Regex;
use rustc_hash::FxHashSet;
use tracing::debug;

use super::error::ResolveError;
use crate::cipher::{CipherProfile, CipherSecret, DecryptError};
use crate::manifest::resolve_uri;
use crate::media::{MediaKind, SubtitleTrack};

// decode/decrypt layers unwrapped within one page
const MAX_LAYERS: usize = 4;

static SOURCES_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"\bsources?["']?\s*:\s*\[\s*\{[^}]*?\b(?:file|src)["']?\s*:\s*["']([^"']+)["']"#,
    )
    .unwrap()
});

static SOURCES_ARRAY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\b(?:sources?|data)["']?\s*:\s*\[([^\]]*)\]"#).unwrap()
});

static SOURCE_LABEL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\b(?:label|quality|res)["']?\s*:\s*["']?([^"',}]*)"#).unwrap()
});

static PLAYER_FILE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"\b(?:file|src|source|hls|video_url)["']?\s*[:=]\s*["']([^"'\s]+?\.(?:m3u8|mp4|mkv|webm|m4v)(?:\?[^"'\s]*)?)["']"#,
    )
    .unwrap()
});

static SOURCE_TAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<source\b[^>]*?\ssrc\s*=\s*["']([^"']+)["']"#).unwrap());

static QUOTED_MEDIA_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"["']((?:https?:)?//[^"'\s]+?\.(?:m3u8|mp4)(?:\?[^"'\s]*)?)["']"#).unwrap()
});

static IFRAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<iframe\b[^>]*?\s(?:data-src|src)\s*=\s*["']([^"']+)["']"#).unwrap()
});

static EMBED_FIELD_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"["'](?:link|embed_url|embed|iframe|redirect)["']\s*:\s*["']((?:https?:)?//[^"']+)["']"#)
        .unwrap()
});

static LOCATION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:window\.)?location(?:\.href)?\s*=\s*["']((?:https?:)?//[^"']+)["']"#).unwrap()
});

static ATOB_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:atob|Base64\.decode|base64_decode)\(\s*["']([A-Za-z0-9+/=]{8,})["']"#).unwrap()
});

static TRACKS_ARRAY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\b(?:tracks|subtitles|captions)["']?\s*:\s*\[([^\]]*)\]"#).unwrap()
});

static OBJECT_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{([^{}]*)\}").unwrap());

static URL_FIELD_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\b(?:file|src|url)["']?\s*:\s*["']([^"']+)["']"#).unwrap()
});

static LABEL_FIELD_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\b(?:label|name|lang|language)["']?\s*:\s*["']([^"']*)["']"#)
        .unwrap()
});

static KIND_FIELD_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bkind["']?\s*:\s*["']([^"']*)["']"#).unwrap()
});

static TRACK_TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<track\b[^>]*>").unwrap());

static ATTRIBUTE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([A-Za-z][\w-]*)\s*=\s*["']([^"']*)["']"#).unwrap());

/// Cipher used to unwrap payloads embedded in a hoster's pages.
#[derive(Debug, Clone)]
pub struct CipherLayer {
    pub profile: CipherProfile,
    pub secret: CipherSecret,
    /// Overrides the profile's own payload search; group 1 (or the whole
    /// match) is the payload.
    pub payload_pattern: Option<Regex>,
}

impl CipherLayer {
    pub fn new(profile: CipherProfile, secret: CipherSecret) -> Self {
        Self {
            profile,
            secret,
            payload_pattern: None,
        }
    }

    pub fn with_payload_pattern(mut self, pattern: Regex) -> Self {
        self.payload_pattern = Some(pattern);
        self
    }

    fn payloads<'a>(&self, text: &'a str) -> Vec<&'a str> {
        match &self.payload_pattern {
            Some(pattern) => pattern
                .captures_iter(text)
                .filter_map(|c| c.get(1).or_else(|| c.get(0)))
                .map(|m| m.as_str())
                .collect(),
            None => self.profile.find_payloads(text),
        }
    }

    fn decrypt(&self, payload: &str) -> Result<String, DecryptError> {
        self.profile.decrypt_to_string(payload, &self.secret)
    }
}

/// One entry of a multi-quality `sources` array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaSource {
    pub url: String,
    // quality given next to the file, e.g. "720p"
    pub label: Option<String>,
}

impl MediaSource {
    pub fn new<S: Into<String>>(url: S) -> Self {
        Self {
            url: url.into(),
            label: None,
        }
    }

    pub fn with_label<S: Into<String>>(mut self, label: S) -> Self {
        self.label = Some(label.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageFinding {
    /// A playable file or manifest URL.
    Media(String),
    /// Several playable files, one per quality, in page order.
    Sources(Vec<MediaSource>),
    /// Another embed page that must be fetched.
    Nested(String),
    Nothing,
}

#[derive(Debug, Clone)]
pub struct Inspection {
    pub finding: PageFinding,
    pub subtitles: Vec<SubtitleTrack>,
}

/// Inspects `text`, fetched from `page_url`. Relative URLs in the result are
/// resolved against `page_url`.
pub fn inspect(
    text: &str,
    page_url: &str,
    cipher: Option<&CipherLayer>,
) -> Result<Inspection, ResolveError> {
    let mut subtitles = Vec::new();
    let finding = inspect_layer(text, page_url, cipher, &mut subtitles, 0)?;
    Ok(Inspection {
        finding,
        subtitles: dedup_subtitles(subtitles),
    })
}

fn inspect_layer(
    text: &str,
    page_url: &str,
    cipher: Option<&CipherLayer>,
    subtitles: &mut Vec<SubtitleTrack>,
    layer: usize,
) -> Result<PageFinding, ResolveError> {
    let text = unescape(text);
    subtitles.extend(find_subtitles(&text, page_url));

    let sources = find_sources(&text);
    if sources.len() > 1 {
        let sources = sources
            .into_iter()
            .map(|source| -> Result<MediaSource, ResolveError> {
                Ok(MediaSource {
                    url: resolve_uri(page_url, &source.url)?,
                    ..source
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(PageFinding::Sources(sources));
    }

    if let Some(media) = find_media_url(&text) {
        return Ok(PageFinding::Media(resolve_uri(page_url, &media)?));
    }

    // unwrapped layers often hold nothing but the URL itself
    if layer > 0 {
        if let Some(finding) = bare_url(&text, page_url) {
            return Ok(finding);
        }
    }

    if layer < MAX_LAYERS {
        let mut decrypt_error = None;
        if let Some(cipher) = cipher {
            for payload in cipher.payloads(&text) {
                match cipher.decrypt(payload) {
                    Ok(plaintext) => {
                        let finding =
                            inspect_layer(&plaintext, page_url, Some(cipher), subtitles, layer + 1)?;
                        if finding != PageFinding::Nothing {
                            return Ok(finding);
                        }
                    }
                    Err(e) => {
                        debug!("{} payload failed to decrypt: {}", cipher.profile.name(), e);
                        decrypt_error.get_or_insert(e);
                    }
                }
            }
        }

        for encoded in ATOB_REGEX.captures_iter(&text).filter_map(|c| c.get(1)) {
            let Some(decoded) = decode_base64_text(encoded.as_str()) else {
                continue;
            };
            let finding = inspect_layer(&decoded, page_url, cipher, subtitles, layer + 1)?;
            if finding != PageFinding::Nothing {
                return Ok(finding);
            }
        }

        if let Some(e) = decrypt_error {
            return Err(e.into());
        }
    }

    if let Some(next) = find_nested_url(&text) {
        return Ok(PageFinding::Nested(resolve_uri(page_url, &next)?));
    }

    Ok(PageFinding::Nothing)
}

fn bare_url(text: &str, page_url: &str) -> Option<PageFinding> {
    let candidate = text.trim().trim_matches(['"', '\'']);
    let is_url = ["http://", "https://", "//"]
        .iter()
        .any(|scheme| candidate.starts_with(scheme));
    if !is_url || candidate.chars().any(char::is_whitespace) {
        return None;
    }
    let url = resolve_uri(page_url, candidate).ok()?;
    Some(if MediaKind::from_url(&url).is_some() {
        PageFinding::Media(url)
    } else {
        PageFinding::Nested(url)
    })
}

fn unescape(text: &str) -> Cow<'_, str> {
    if text.contains("\\/") || text.contains("\\u0026") {
        Cow::Owned(text.replace("\\/", "/").replace("\\u0026", "&"))
    } else {
        Cow::Borrowed(text)
    }
}

fn decode_base64_text(encoded: &str) -> Option<String> {
    let bytes = STANDARD
        .decode(encoded)
        .or_else(|_| STANDARD_NO_PAD.decode(encoded.trim_end_matches('=')))
        .ok()?;
    String::from_utf8(bytes).ok()
}

/// Entries of the first `sources` array in `text` that name a file, unresolved
/// and deduplicated by URL.
pub fn find_sources(text: &str) -> Vec<MediaSource> {
    let Some(array) = SOURCES_ARRAY_REGEX
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .find(|array| URL_FIELD_REGEX.is_match(array.as_str()))
    else {
        return Vec::new();
    };

    let mut seen = FxHashSet::default();
    OBJECT_REGEX
        .captures_iter(array.as_str())
        .filter_map(|c| c.get(1))
        .filter_map(|object| {
            let object = object.as_str();
            let url = first_capture(&URL_FIELD_REGEX, object)?;
            let source = MediaSource::new(url);
            Some(match first_capture(&SOURCE_LABEL_REGEX, object) {
                Some(label) => source.with_label(label),
                None => source,
            })
        })
        .filter(|source| seen.insert(source.url.clone()))
        .collect()
}

/// First playable file reference in `text`, unresolved.
pub fn find_media_url(text: &str) -> Option<String> {
    [
        &*SOURCES_REGEX,
        &*PLAYER_FILE_REGEX,
        &*SOURCE_TAG_REGEX,
        &*QUOTED_MEDIA_REGEX,
    ]
    .iter()
    .find_map(|regex| first_capture(regex, text))
}

/// First nested embed URL in `text`, unresolved.
pub fn find_nested_url(text: &str) -> Option<String> {
    IFRAME_REGEX
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .find(|src| {
            !src.is_empty() && !src.starts_with("about:") && !src.starts_with("javascript:")
        })
        .map(str::to_string)
        .or_else(|| first_capture(&EMBED_FIELD_REGEX, text))
        .or_else(|| first_capture(&LOCATION_REGEX, text))
}

fn first_capture(regex: &Regex, text: &str) -> Option<String> {
    regex
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

fn is_subtitle_kind(kind: Option<&str>) -> bool {
    !matches!(
        kind.map(|k| k.to_ascii_lowercase()).as_deref(),
        Some("thumbnails" | "chapters" | "metadata")
    )
}

/// Subtitle tracks declared in player setups, JSON responses and `<track>`
/// elements.
pub fn find_subtitles(text: &str, page_url: &str) -> Vec<SubtitleTrack> {
    let mut tracks = Vec::new();

    for array in TRACKS_ARRAY_REGEX.captures_iter(text).filter_map(|c| c.get(1)) {
        for object in OBJECT_REGEX.captures_iter(array.as_str()).filter_map(|c| c.get(1)) {
            let object = object.as_str();
            let kind = first_capture(&KIND_FIELD_REGEX, object);
            if !is_subtitle_kind(kind.as_deref()) {
                continue;
            }
            let Some(url) = first_capture(&URL_FIELD_REGEX, object) else {
                continue;
            };
            let label = first_capture(&LABEL_FIELD_REGEX, object)
                .unwrap_or_else(|| "Unknown".to_string());
            match resolve_uri(page_url, &url) {
                Ok(url) => tracks.push(SubtitleTrack::new(url, label)),
                Err(e) => debug!("skipping subtitle {:?}: {}", url, e),
            }
        }
    }

    for tag in TRACK_TAG_REGEX.find_iter(text) {
        let mut src = None;
        let mut label = None;
        let mut srclang = None;
        let mut kind = None;
        for attribute in ATTRIBUTE_REGEX.captures_iter(tag.as_str()) {
            let value = attribute[2].trim().to_string();
            match attribute[1].to_ascii_lowercase().as_str() {
                "src" => src = Some(value),
                "label" => label = Some(value),
                "srclang" => srclang = Some(value),
                "kind" => kind = Some(value),
                _ => {}
            }
        }
        if !is_subtitle_kind(kind.as_deref()) {
            continue;
        }
        if let Some(src) = src.filter(|s| !s.is_empty()) {
            let label = label
                .filter(|l| !l.is_empty())
                .or(srclang)
                .unwrap_or_else(|| "Unknown".to_string());
            match resolve_uri(page_url, &src) {
                Ok(url) => tracks.push(SubtitleTrack::new(url, label)),
                Err(e) => debug!("skipping subtitle {:?}: {}", src, e),
            }
        }
    }

    tracks
}

pub(crate) fn dedup_subtitles(tracks: Vec<SubtitleTrack>) -> Vec<SubtitleTrack> {
    let mut seen = FxHashSet::default();
    tracks
        .into_iter()
        .filter(|track| seen.insert(track.url.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAYER_PAGE: &str = include_str!("../../tests/test_data/pages/player.html");
    const IFRAME_PAGE: &str = include_str!("../../tests/test_data/pages/iframe.html");
    const ATOB_PAGE: &str = include_str!("../../tests/test_data/pages/atob.html");
    const CRYPTO_PAGE: &str = include_str!("../../tests/test_data/pages/crypto.html");

    #[test]
    fn test_player_page_media_and_subtitles() {
        let inspection = inspect(PLAYER_PAGE, "https://play.example.com/e/xyz", None).unwrap();
        assert_eq!(
            inspection.finding,
            PageFinding::Media("https://cdn.example.net/hls/abc/master.m3u8".to_string())
        );
        assert_eq!(
            inspection.subtitles,
            vec![
                SubtitleTrack::new("https://play.example.com/subs/en.vtt", "English"),
                SubtitleTrack::new("https://subs.example.org/es.vtt", "Spanish"),
            ]
        );
    }

    #[test]
    fn test_iframe_page_is_nested() {
        let inspection = inspect(IFRAME_PAGE, "https://site.example/watch/1", None).unwrap();
        assert_eq!(
            inspection.finding,
            PageFinding::Nested("https://play.example.com/e/xyz".to_string())
        );
        assert!(inspection.subtitles.is_empty());
    }

    #[test]
    fn test_atob_layer_unwrapped() {
        let inspection = inspect(ATOB_PAGE, "https://k.example/player.php", None).unwrap();
        assert_eq!(
            inspection.finding,
            PageFinding::Media("https://k.example/videos/ep1.mp4".to_string())
        );
    }

    #[test]
    fn test_cipher_payload_decrypted() {
        let layer = CipherLayer::new(
            CipherProfile::default(),
            CipherSecret::password("tachi-embed-key"),
        );
        let inspection = inspect(CRYPTO_PAGE, "https://c.example/e/1", Some(&layer)).unwrap();
        assert_eq!(
            inspection.finding,
            PageFinding::Media("https://cdn.example.net/hls/master.m3u8".to_string())
        );

        // without the cipher only the decoy iframe is visible
        let inspection = inspect(CRYPTO_PAGE, "https://c.example/e/1", None).unwrap();
        assert_eq!(
            inspection.finding,
            PageFinding::Nested("https://c.example/ads/frame.html".to_string())
        );
    }

    #[test]
    fn test_wrong_password_is_decrypt_error() {
        let layer = CipherLayer::new(CipherProfile::default(), CipherSecret::password("nope"));
        let result = inspect(CRYPTO_PAGE, "https://c.example/e/1", Some(&layer));
        assert!(matches!(result, Err(ResolveError::DecryptError(_))));
    }

    #[test]
    fn test_json_sources_without_extension() {
        let body = r#"{"sources":[{"file":"https:\/\/cdn.example\/stream?id=9","type":"hls"}],"tracks":[{"file":"https:\/\/cdn.example\/thumbs.vtt","kind":"thumbnails"},{"file":"https:\/\/cdn.example\/en.vtt","label":"English","kind":"captions"}]}"#;
        let inspection = inspect(body, "https://api.example/source/1", None).unwrap();
        assert_eq!(
            inspection.finding,
            PageFinding::Media("https://cdn.example/stream?id=9".to_string())
        );
        assert_eq!(
            inspection.subtitles,
            vec![SubtitleTrack::new("https://cdn.example/en.vtt", "English")]
        );
    }

    #[test]
    fn test_multi_quality_sources() {
        let html = r#"<script>jwplayer("v").setup({sources:[{file:"/360.mp4",label:"360p"},{file:"https://v.example/1080.mp4",label:"1080p"},{file:"/360.mp4",label:"360p"}]});</script>"#;
        let inspection = inspect(html, "https://v.example/e/3", None).unwrap();
        assert_eq!(
            inspection.finding,
            PageFinding::Sources(vec![
                MediaSource::new("https://v.example/360.mp4").with_label("360p"),
                MediaSource::new("https://v.example/1080.mp4").with_label("1080p"),
            ])
        );
    }

    #[test]
    fn test_fembed_data_array() {
        let body = r#"{"success":true,"data":[{"file":"https:\/\/f.example\/v\/480","label":"480p","type":"mp4"},{"file":"https:\/\/f.example\/v\/720","label":"720p","type":"mp4"}]}"#;
        let sources = find_sources(&unescape(body));
        let labels: Vec<_> = sources.iter().filter_map(|s| s.label.as_deref()).collect();
        assert_eq!(labels, ["480p", "720p"]);
        assert_eq!(sources[1].url, "https://f.example/v/720");
    }

    #[test]
    fn test_single_source_stays_media() {
        let html = r#"sources: [{file: "https://v.example/only.m3u8", label: "auto"}]"#;
        let inspection = inspect(html, "https://v.example/e/4", None).unwrap();
        assert_eq!(
            inspection.finding,
            PageFinding::Media("https://v.example/only.m3u8".to_string())
        );
    }

    #[test]
    fn test_nothing_found() {
        let inspection = inspect("<html><body>Video removed</body></html>", "https://x/", None)
            .unwrap();
        assert_eq!(inspection.finding, PageFinding::Nothing);
    }

    #[test]
    fn test_track_elements() {
        let html = r#"<video><track kind="captions" src="/c/fr.vtt" srclang="fr"><track kind="chapters" src="/c/ch.vtt"></video>"#;
        assert_eq!(
            find_subtitles(html, "https://v.example/e/2"),
            vec![SubtitleTrack::new("https://v.example/c/fr.vtt", "fr")]
        );
    }
}
