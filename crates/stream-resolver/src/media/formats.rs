use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

/// Kind of playable resource a URL points at, judged by its path extension.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Hls,
    Mp4,
    Mkv,
    Webm,
}

impl MediaKind {
    pub fn as_str(&self) -> &str {
        match self {
            MediaKind::Hls => "hls",
            MediaKind::Mp4 => "mp4",
            MediaKind::Mkv => "mkv",
            MediaKind::Webm => "webm",
        }
    }

    pub fn from_extension(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "m3u8" => Some(MediaKind::Hls),
            "mp4" | "m4v" => Some(MediaKind::Mp4),
            "mkv" => Some(MediaKind::Mkv),
            "webm" => Some(MediaKind::Webm),
            _ => None,
        }
    }

    /// Looks at the last path segment of an absolute URL only; query and
    /// fragment are ignored.
    pub fn from_url(url: &str) -> Option<Self> {
        let url = Url::parse(url).ok()?;
        let last_segment = url.path_segments()?.next_back()?;
        let (_, extension) = last_segment.rsplit_once('.')?;
        Self::from_extension(extension)
    }

    pub fn is_manifest(&self) -> bool {
        matches!(self, MediaKind::Hls)
    }
}

impl Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hls" => Ok(MediaKind::Hls),
            other => Self::from_extension(other).ok_or(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_url() {
        assert_eq!(
            MediaKind::from_url("https://h/a/master.m3u8?token=x.mp4"),
            Some(MediaKind::Hls)
        );
        assert_eq!(MediaKind::from_url("https://h/video.MP4"), Some(MediaKind::Mp4));
        assert_eq!(MediaKind::from_url("https://h/e/abc123"), None);
        assert_eq!(MediaKind::from_url("https://player.example.com"), None);
        assert_eq!(
            MediaKind::from_url("https://h/a/../v.webm#t=10"),
            Some(MediaKind::Webm)
        );
        assert_eq!(MediaKind::from_url("/relative/v.webm"), None);
    }
}
