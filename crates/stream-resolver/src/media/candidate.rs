use serde::{Deserialize, Serialize};

/// One hoster, server or dub/sub track to attempt resolution against.
///
/// Candidates are produced by whatever scraped the episode or chapter page and
/// are consumed by a single resolution pass.
///
/// # Examples
///
/// ```rust
/// use stream_resolver::media::Candidate;
///
/// let candidate = Candidate::new("Vidplay", "https://vidplay.example/e/abc123")
///     .with_referer("https://anime.example/watch/1")
///     .with_language("Sub");
/// assert_eq!(candidate.language_tag, "Sub");
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    // display name of the server, used as label prefix, e.g. "Vidplay"
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub referer: String,
    #[serde(default, alias = "language")]
    pub language_tag: String,
    /// Registry id of the extractor to use. When absent the registry matches
    /// `name` against configured hosters first and `url` second; built-in
    /// extractors are only chosen by `hoster` or `url`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hoster: Option<String>,
}

impl Candidate {
    pub fn new<S1: Into<String>, S2: Into<String>>(name: S1, url: S2) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            referer: String::new(),
            language_tag: String::new(),
            hoster: None,
        }
    }

    pub fn with_referer<S: Into<String>>(mut self, referer: S) -> Self {
        self.referer = referer.into();
        self
    }

    pub fn with_language<S: Into<String>>(mut self, language_tag: S) -> Self {
        self.language_tag = language_tag.into();
        self
    }

    pub fn with_hoster<S: Into<String>>(mut self, hoster: S) -> Self {
        self.hoster = Some(hoster.into());
        self
    }

    /// Label for a stream of this candidate; `quality` is omitted when empty.
    pub fn stream_label(&self, quality: Option<&str>) -> String {
        let mut label = match quality {
            Some(quality) if !quality.is_empty() => format!("{}: {}", self.name, quality),
            _ => self.name.clone(),
        };
        if !self.language_tag.is_empty() {
            label.push_str(" - ");
            label.push_str(&self.language_tag);
        }
        label
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_label_composition() {
        let candidate = Candidate::new("Vidplay", "https://v.example/e/1");
        assert_eq!(candidate.stream_label(Some("1080p")), "Vidplay: 1080p");
        assert_eq!(candidate.stream_label(None), "Vidplay");

        let dubbed = candidate.with_language("Dub");
        assert_eq!(dubbed.stream_label(Some("720p")), "Vidplay: 720p - Dub");
        assert_eq!(dubbed.stream_label(Some("")), "Vidplay - Dub");
    }

    #[test]
    fn test_deserialize_candidate_list() {
        let json = r#"[
            {"name": "Vidplay", "url": "https://v.example/e/1", "language": "Sub"},
            {"name": "Mp4Upload", "url": "https://m.example/x.mp4", "referer": "https://site.example/", "hoster": "direct"}
        ]"#;
        let candidates: Vec<Candidate> = serde_json::from_str(json).unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].language_tag, "Sub");
        assert!(candidates[0].referer.is_empty());
        assert_eq!(candidates[1].hoster.as_deref(), Some("direct"));
    }
}
