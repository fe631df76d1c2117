use serde::{Deserialize, Serialize};

/// User ranking preferences, supplied by the settings layer.
///
/// Every field is a substring matched against stream labels. Empty strings
/// express "no preference".
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Preference {
    // e.g. "1080"
    #[serde(alias = "quality")]
    pub preferred_quality_substring: String,
    // e.g. "Vidplay"
    #[serde(alias = "server")]
    pub preferred_server_substring: String,
    // e.g. "Dub"
    #[serde(alias = "language")]
    pub preferred_language: String,
    #[serde(alias = "subtitle_language", skip_serializing_if = "Option::is_none")]
    pub preferred_subtitle_language: Option<String>,
}

impl Preference {
    pub fn with_quality<S: Into<String>>(mut self, quality: S) -> Self {
        self.preferred_quality_substring = quality.into();
        self
    }

    pub fn with_server<S: Into<String>>(mut self, server: S) -> Self {
        self.preferred_server_substring = server.into();
        self
    }

    pub fn with_language<S: Into<String>>(mut self, language: S) -> Self {
        self.preferred_language = language.into();
        self
    }

    pub fn with_subtitle_language<S: Into<String>>(mut self, language: S) -> Self {
        self.preferred_subtitle_language = Some(language.into());
        self
    }
}
