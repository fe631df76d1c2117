use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SubtitleTrack {
    pub url: String,
    // language or display name, e.g. "English"
    pub label: String,
}

impl SubtitleTrack {
    pub fn new<S1: Into<String>, S2: Into<String>>(url: S1, label: S2) -> Self {
        Self {
            url: url.into(),
            label: label.into(),
        }
    }
}

/// A resolved, playable URL plus everything a player needs to open it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MediaStream {
    // Url of the stream, never empty
    pub url: String,
    // e.g., "Vidplay: 1080p - Sub"
    pub label: String,
    // page the stream was discovered on
    pub referer: String,
    pub request_headers: FxHashMap<String, String>,
    pub subtitles: Vec<SubtitleTrack>,
}

impl MediaStream {
    pub fn new<S1: Into<String>, S2: Into<String>, S3: Into<String>>(
        url: S1,
        label: S2,
        referer: S3,
    ) -> Self {
        Self {
            url: url.into(),
            label: label.into(),
            referer: referer.into(),
            request_headers: FxHashMap::default(),
            subtitles: Vec::new(),
        }
    }

    pub fn with_header<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.request_headers.insert(key.into(), value.into());
        self
    }

    pub fn with_subtitles(mut self, subtitles: Vec<SubtitleTrack>) -> Self {
        self.subtitles = subtitles;
        self
    }
}

impl fmt::Display for MediaStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.subtitles.is_empty() {
            write!(f, "{} - {}", self.label, self.url)
        } else {
            write!(
                f,
                "{} - {} ({} subtitles)",
                self.label,
                self.url,
                self.subtitles.len()
            )
        }
    }
}
