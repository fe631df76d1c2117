//! Preference ordering of aggregated streams.

use std::cmp::Reverse;
use std::sync::LazyLock;

use regex::Regex;

use crate::media::{MediaStream, Preference};

static HEIGHT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d+)p\d*\b").unwrap());

fn contains_ignore_case(haystack_lower: &str, needle: &str) -> bool {
    !needle.is_empty() && haystack_lower.contains(&needle.to_lowercase())
}

/// Largest run of ASCII digits in `label`, 0 when there is none.
pub fn largest_number(label: &str) -> u64 {
    label
        .split(|c: char| !c.is_ascii_digit())
        .filter(|token| !token.is_empty())
        .map(|token| token.parse::<u64>().unwrap_or(u64::MAX))
        .max()
        .unwrap_or(0)
}

/// Numeric quality of `label`: the largest `<height>p` token, or the largest
/// number when the label names no height.
pub fn quality_number(label: &str) -> u64 {
    HEIGHT_REGEX
        .captures_iter(label)
        .filter_map(|c| c[1].parse::<u64>().ok())
        .max()
        .unwrap_or_else(|| largest_number(label))
}

/// Sorts `streams` by, in order: server match, language match, quality
/// match, then the numeric quality of the label. The sort is stable, so
/// equal streams keep their aggregation order.
pub fn rank(mut streams: Vec<MediaStream>, pref: &Preference) -> Vec<MediaStream> {
    streams.sort_by_cached_key(|stream| {
        let label = stream.label.to_lowercase();
        Reverse((
            contains_ignore_case(&label, &pref.preferred_server_substring),
            contains_ignore_case(&label, &pref.preferred_language),
            contains_ignore_case(&label, &pref.preferred_quality_substring),
            quality_number(&label),
        ))
    });

    match pref.preferred_subtitle_language.as_deref() {
        Some(language) if !language.is_empty() => streams
            .into_iter()
            .map(|stream| order_subtitles(stream, language))
            .collect(),
        _ => streams,
    }
}

/// Moves tracks whose label contains `language` to the front.
fn order_subtitles(mut stream: MediaStream, language: &str) -> MediaStream {
    stream
        .subtitles
        .sort_by_cached_key(|track| !contains_ignore_case(&track.label.to_lowercase(), language));
    stream
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::SubtitleTrack;

    fn streams(labels: &[&str]) -> Vec<MediaStream> {
        labels
            .iter()
            .enumerate()
            .map(|(i, label)| MediaStream::new(format!("https://v/{i}"), *label, ""))
            .collect()
    }

    fn labels(streams: &[MediaStream]) -> Vec<&str> {
        streams.iter().map(|s| s.label.as_str()).collect()
    }

    #[test]
    fn test_quality_preference_is_stable() {
        let pref = Preference::default().with_quality("1080");
        let ranked = rank(streams(&["A 720p", "B 720p", "A 1080p"]), &pref);
        assert_eq!(labels(&ranked), ["A 1080p", "A 720p", "B 720p"]);
    }

    #[test]
    fn test_key_priority() {
        let pref = Preference::default()
            .with_server("vidplay")
            .with_language("dub")
            .with_quality("720");
        let ranked = rank(
            streams(&[
                "Filemoon: 720p - Dub",
                "Vidplay: 1080p - Sub",
                "Vidplay: 720p - Sub",
                "Vidplay: 360p - Dub",
            ]),
            &pref,
        );
        assert_eq!(
            labels(&ranked),
            [
                "Vidplay: 360p - Dub",
                "Vidplay: 720p - Sub",
                "Vidplay: 1080p - Sub",
                "Filemoon: 720p - Dub",
            ]
        );
    }

    #[test]
    fn test_empty_preference_sorts_by_number() {
        let ranked = rank(
            streams(&["Server: 480p", "Server: Source", "Server: 1080p", "Other: 480p"]),
            &Preference::default(),
        );
        assert_eq!(
            labels(&ranked),
            ["Server: 1080p", "Server: 480p", "Other: 480p", "Server: Source"]
        );
    }

    #[test]
    fn test_subtitles_reordered() {
        let stream = MediaStream::new("https://v/1", "A", "").with_subtitles(vec![
            SubtitleTrack::new("https://s/es.vtt", "Spanish"),
            SubtitleTrack::new("https://s/en.vtt", "English"),
            SubtitleTrack::new("https://s/en-cc.vtt", "English (CC)"),
        ]);
        let pref = Preference::default().with_subtitle_language("english");

        let ranked = rank(vec![stream], &pref);
        let subs: Vec<&str> = ranked[0].subtitles.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(subs, ["English", "English (CC)", "Spanish"]);
    }

    #[test]
    fn test_largest_number() {
        assert_eq!(largest_number("Vidplay: 720p (2800 kbps)"), 2800);
        assert_eq!(largest_number("Source"), 0);
    }

    #[test]
    fn test_height_wins_over_bitrate() {
        assert_eq!(quality_number("Vidplay: 720p (2800 kbps)"), 720);
        assert_eq!(quality_number("Vidplay: 1080p60 - Dub"), 1080);
        assert_eq!(quality_number("Vidplay: 600 kbps"), 600);
        assert_eq!(quality_number("Server 5"), 5);

        let ranked = rank(
            streams(&["A: 720p (2800 kbps)", "A: 720p (1400 kbps)", "A: 1080p"]),
            &Preference::default(),
        );
        assert_eq!(
            labels(&ranked),
            ["A: 1080p", "A: 720p (2800 kbps)", "A: 720p (1400 kbps)"]
        );
    }
}
