use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct SourceResponse {
    pub hls: Option<String>,
    #[serde(default)]
    pub subtitles: Vec<SubtitleEntry>,
}

#[derive(Debug, Deserialize)]
pub struct SubtitleEntry {
    #[serde(default)]
    pub name: String,
    pub src: String,
}
