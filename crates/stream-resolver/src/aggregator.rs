//! Concurrent fan-out over every candidate of a title.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::extractor::{EmbedResolver, ResolveError};
use crate::media::{Candidate, MediaStream};

pub const DEFAULT_MAX_CONCURRENCY: usize = 6;

type Outcome = (usize, Result<Vec<MediaStream>, ResolveError>);

/// Per-candidate results, indexed by input position.
struct Collected {
    streams: Vec<Option<Vec<MediaStream>>>,
    completed: usize,
}

/// Runs an [`EmbedResolver`] per candidate, at most `max_concurrency` at a
/// time. A failing (or panicking) candidate never affects its siblings.
#[derive(Clone)]
pub struct SourceAggregator {
    resolver: EmbedResolver,
    max_concurrency: usize,
}

impl SourceAggregator {
    pub fn new(resolver: EmbedResolver) -> Self {
        Self {
            resolver,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Streams of all candidates, concatenated in input order.
    ///
    /// When `deadline` elapses unfinished candidates are aborted and the
    /// finished ones are kept. Fails with [`ResolveError::DeadlineExceeded`]
    /// if none finished in time, and with [`ResolveError::AllSourcesFailed`]
    /// if candidates were given but no stream came out.
    pub async fn aggregate(
        &self,
        candidates: &[Candidate],
        deadline: Option<Duration>,
    ) -> Result<Vec<MediaStream>, ResolveError> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut tasks: JoinSet<Outcome> = JoinSet::new();
        for (idx, candidate) in candidates.iter().cloned().enumerate() {
            let resolver = self.resolver.clone();
            let semaphore = semaphore.clone();
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                let result = resolver.resolve(&candidate).await;
                if let Err(e) = &result {
                    debug!("Source '{}' failed: {}", candidate.name, e);
                }
                (idx, result)
            });
        }

        let mut collected = Collected {
            streams: vec![None; candidates.len()],
            completed: 0,
        };

        match deadline {
            Some(deadline) => {
                let drained =
                    tokio::time::timeout(deadline, drain(&mut tasks, &mut collected)).await;
                if drained.is_err() {
                    debug!(
                        "Deadline of {:?} elapsed, abandoning {} sources",
                        deadline,
                        tasks.len()
                    );
                    tasks.abort_all();
                    if collected.completed == 0 {
                        return Err(ResolveError::DeadlineExceeded(deadline));
                    }
                }
            }
            None => drain(&mut tasks, &mut collected).await,
        }

        let succeeded = collected.streams.iter().filter(|s| s.is_some()).count();
        let streams: Vec<MediaStream> = collected.streams.into_iter().flatten().flatten().collect();
        info!(
            "{} streams from {}/{} sources ({} finished)",
            streams.len(),
            succeeded,
            candidates.len(),
            collected.completed
        );

        if streams.is_empty() {
            return Err(ResolveError::AllSourcesFailed {
                attempted: candidates.len(),
            });
        }
        Ok(streams)
    }
}

async fn drain(tasks: &mut JoinSet<Outcome>, collected: &mut Collected) {
    while let Some(joined) = tasks.join_next().await {
        collected.completed += 1;
        match joined {
            Ok((idx, Ok(streams))) => collected.streams[idx] = Some(streams),
            Ok((_, Err(_))) => {}
            Err(e) => debug!("Source task did not finish: {}", e),
        }
    }
}
