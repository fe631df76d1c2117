use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use rustc_hash::FxHashMap;
use stream_resolver::cipher::CipherProfile;
use stream_resolver::{
    Candidate, CipherSecret, FetchResponse, Fetcher, HosterConfig, Preference, ResolveError,
    ResolverConfig, StreamResolver,
};

const IFRAME_PAGE: &str = include_str!("test_data/pages/iframe.html");
const PLAYER_PAGE: &str = include_str!("test_data/pages/player.html");
const CRYPTO_PAGE: &str = include_str!("test_data/pages/crypto.html");
const MASTER: &str = include_str!("test_data/manifests/master.m3u8");

/// Serves fixed pages; `slow` URLs answer after a delay.
#[derive(Default)]
struct SiteFetcher {
    pages: FxHashMap<String, String>,
    slow: FxHashMap<String, Duration>,
}

impl SiteFetcher {
    fn page(mut self, url: &str, body: &str) -> Self {
        self.pages.insert(url.to_string(), body.to_string());
        self
    }

    fn slow_page(mut self, url: &str, body: &str, delay: Duration) -> Self {
        self.slow.insert(url.to_string(), delay);
        self.page(url, body)
    }
}

#[async_trait]
impl Fetcher for SiteFetcher {
    async fn fetch(
        &self,
        url: &str,
        _headers: &FxHashMap<String, String>,
    ) -> Result<FetchResponse, ResolveError> {
        if let Some(delay) = self.slow.get(url) {
            tokio::time::sleep(*delay).await;
        }
        let (status, body) = match self.pages.get(url) {
            Some(body) => (200, body.clone()),
            None => (404, String::new()),
        };
        Ok(FetchResponse {
            status,
            url: url.to_string(),
            headers: FxHashMap::default(),
            body: Bytes::from(body),
        })
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn resolver(fetcher: SiteFetcher) -> StreamResolver {
    init_tracing();
    StreamResolver::builder()
        .fetcher(Arc::new(fetcher))
        .build()
        .unwrap()
}

fn player(file: &str) -> String {
    format!(r#"<script>jwplayer("p").setup({{"file": "{file}"}});</script>"#)
}

fn labels(streams: &[stream_resolver::MediaStream]) -> Vec<&str> {
    streams.iter().map(|s| s.label.as_str()).collect()
}

#[tokio::test]
async fn failing_sources_do_not_affect_siblings() {
    let mut fetcher = SiteFetcher::default();
    for i in [1, 3, 5] {
        fetcher = fetcher.page(
            &format!("https://e.example/{i}"),
            &player(&format!("https://v.example/{i}.mp4")),
        );
    }
    // 2 is missing, 4 has nothing playable
    fetcher = fetcher.page("https://e.example/4", "<p>This video was removed</p>");

    let candidates: Vec<Candidate> = (1..=5)
        .map(|i| Candidate::new(format!("Server {i}"), format!("https://e.example/{i}")))
        .collect();

    let streams = resolver(fetcher)
        .resolve_best_streams(&candidates, &Preference::default(), None)
        .await
        .unwrap();

    assert_eq!(labels(&streams), ["Server 5", "Server 3", "Server 1"]);
}

#[tokio::test]
async fn every_source_failing_is_an_error() {
    let candidates = vec![
        Candidate::new("A", "https://e.example/a"),
        Candidate::new("B", "https://e.example/b").with_hoster("nonexistent"),
        Candidate::new("C", ""),
    ];
    let result = resolver(SiteFetcher::default())
        .resolve_best_streams(&candidates, &Preference::default(), None)
        .await;
    assert!(matches!(
        result,
        Err(ResolveError::AllSourcesFailed { attempted: 3 })
    ));
}

#[tokio::test]
async fn no_candidates_is_an_empty_result() {
    let streams = resolver(SiteFetcher::default())
        .resolve_best_streams(&[], &Preference::default(), None)
        .await
        .unwrap();
    assert!(streams.is_empty());
}

#[tokio::test]
async fn quality_preference_keeps_ties_in_order() {
    let candidates = vec![
        Candidate::new("A 720p", "https://a.example/720.mp4"),
        Candidate::new("B 720p", "https://b.example/720.mp4"),
        Candidate::new("A 1080p", "https://a.example/1080.mp4"),
    ];
    let streams = resolver(SiteFetcher::default())
        .resolve_best_streams(
            &candidates,
            &Preference::default().with_quality("1080"),
            None,
        )
        .await
        .unwrap();
    assert_eq!(labels(&streams), ["A 1080p", "A 720p", "B 720p"]);
}

#[tokio::test(start_paused = true)]
async fn slow_sources_are_abandoned_at_the_deadline() {
    let fetcher = SiteFetcher::default()
        .slow_page(
            "https://slow.example/e/1",
            &player("https://slow.example/v.mp4"),
            Duration::from_secs(120),
        )
        .page("https://fast.example/e/1", &player("https://fast.example/v.mp4"));
    let candidates = vec![
        Candidate::new("Slow", "https://slow.example/e/1"),
        Candidate::new("Fast", "https://fast.example/e/1"),
    ];
    let resolver = resolver(fetcher);

    let streams = resolver
        .resolve_best_streams(
            &candidates,
            &Preference::default(),
            Some(Duration::from_secs(10)),
        )
        .await
        .unwrap();
    assert_eq!(labels(&streams), ["Fast"]);

    let result = resolver
        .resolve_best_streams(
            &candidates[..1],
            &Preference::default(),
            Some(Duration::from_secs(10)),
        )
        .await;
    assert!(matches!(result, Err(ResolveError::DeadlineExceeded(_))));
}

#[tokio::test]
async fn mixed_hosters_are_ranked_by_preference() {
    init_tracing();
    let fetcher = SiteFetcher::default()
        .page("https://site.example/watch/1", IFRAME_PAGE)
        .page("https://play.example.com/e/xyz", PLAYER_PAGE)
        .page("https://cdn.example.net/hls/abc/master.m3u8", MASTER)
        .page("https://c.example/e/1", CRYPTO_PAGE)
        .page("https://cdn.example.net/hls/master.m3u8", MASTER);

    let config = ResolverConfig {
        hosters: vec![HosterConfig {
            id: "tachi".to_string(),
            url_pattern: Some(r"^https://c\.example/e/".to_string()),
            profile: CipherProfile::default(),
            secret: CipherSecret::password("tachi-embed-key"),
            payload_pattern: None,
        }],
        ..ResolverConfig::default()
    };
    let resolver = StreamResolver::builder()
        .config(config)
        .fetcher(Arc::new(fetcher))
        .build()
        .unwrap();

    let candidates = vec![
        Candidate::new("Vidplay", "https://site.example/watch/1").with_language("Sub"),
        Candidate::new("Tachi", "https://c.example/e/1").with_language("Dub"),
    ];
    let pref = Preference::default()
        .with_language("dub")
        .with_quality("720")
        .with_subtitle_language("spanish");

    let streams = resolver
        .resolve_best_streams(&candidates, &pref, None)
        .await
        .unwrap();

    assert_eq!(
        labels(&streams),
        [
            "Tachi: 720p - Dub",
            "Tachi: 1080p - Dub",
            "Tachi: 360p - Dub",
            "Vidplay: 720p - Sub",
            "Vidplay: 1080p - Sub",
            "Vidplay: 360p - Sub",
        ]
    );
    assert!(streams[0].subtitles.is_empty());
    assert_eq!(streams[3].subtitles[0].label, "Spanish");
    assert_eq!(streams[3].request_headers["Origin"], "https://cdn.example.net");
}
