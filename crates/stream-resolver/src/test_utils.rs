use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use rustc_hash::FxHashMap;

use crate::extractor::error::ResolveError;
use crate::extractor::fetch::{FetchResponse, Fetcher};
use crate::extractor::hoster_extractor::ResolveContext;

struct Route {
    status: u16,
    body: String,
    delay: Option<Duration>,
}

/// In-memory fetcher serving canned bodies; unknown URLs answer 404.
#[derive(Default)]
pub(crate) struct MockFetcher {
    routes: FxHashMap<String, Route>,
    requests: Mutex<Vec<(String, FxHashMap<String, String>)>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(self, url: &str, body: &str) -> Self {
        self.route_status(url, 200, body)
    }

    pub fn route_status(mut self, url: &str, status: u16, body: &str) -> Self {
        self.routes.insert(
            url.to_string(),
            Route {
                status,
                body: body.to_string(),
                delay: None,
            },
        );
        self
    }

    pub fn route_delayed(mut self, url: &str, body: &str, delay: Duration) -> Self {
        self.routes.insert(
            url.to_string(),
            Route {
                status: 200,
                body: body.to_string(),
                delay: Some(delay),
            },
        );
        self
    }

    pub fn requests(&self) -> Vec<(String, FxHashMap<String, String>)> {
        self.requests.lock().unwrap().clone()
    }

    /// Most requests that were being served at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    pub fn context(self) -> (Arc<MockFetcher>, ResolveContext) {
        let fetcher = Arc::new(self);
        let ctx = ResolveContext::new(fetcher.clone());
        (fetcher, ctx)
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(
        &self,
        url: &str,
        headers: &FxHashMap<String, String>,
    ) -> Result<FetchResponse, ResolveError> {
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), headers.clone()));

        let (status, body, delay) = match self.routes.get(url) {
            Some(route) => (route.status, route.body.clone(), route.delay),
            None => (404, String::new(), None),
        };
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        Ok(FetchResponse {
            status,
            url: url.to_string(),
            headers: FxHashMap::default(),
            body: Bytes::from(body),
        })
    }
}
