//! Asynchronous search session: loading, queueing and superseding queries.
//!
//! A session wraps one [`QueryClient`]. The bundle is fetched asynchronously; queries that
//! arrive before it is resident are queued or rejected, and only the most recent query's
//! results are ever handed back for display.

use crate::error::{CorruptIndexError, NotReadyError, QueryError};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::PoisonError;
use tokio::sync::{Mutex, watch};
use tokio_util::sync::CancellationToken;

use super::query::{QueryClient, SearchHit};

/// What to do with a query issued before the bundle has loaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PendingPolicy {
    /// Hold the query until the session is ready (or unavailable).
    #[default]
    Queue,
    /// Fail immediately with [`NotReadyError`].
    Reject,
}

/// Observable session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Uninitialized,
    Ready,
    Querying,
    ResultsAvailable,
    Unavailable,
}

impl SessionPhase {
    const fn is_settled(self) -> bool {
        !matches!(self, Self::Uninitialized)
    }
}

/// Result of submitting a query.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// Ranked hits for the most recent query.
    Results(Vec<SearchHit>),
    /// A newer query was submitted meanwhile; these results must not be rendered.
    Superseded,
}

/// Shared handle to a query client with asynchronous loading.
#[derive(Debug)]
pub struct SearchSession {
    client: Mutex<QueryClient>,
    phase: watch::Sender<SessionPhase>,
    generation: AtomicU64,
    pending: std::sync::Mutex<CancellationToken>,
    policy: PendingPolicy,
}

impl Default for SearchSession {
    fn default() -> Self {
        Self::new(PendingPolicy::default())
    }
}

impl SearchSession {
    pub fn new(policy: PendingPolicy) -> Self {
        let (phase, _) = watch::channel(SessionPhase::Uninitialized);
        Self {
            client: Mutex::new(QueryClient::new()),
            phase,
            generation: AtomicU64::new(0),
            pending: std::sync::Mutex::new(CancellationToken::new()),
            policy,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        *self.phase.borrow()
    }

    /// Receiver for phase changes, e.g. to show a "search unavailable" state.
    pub fn subscribe(&self) -> watch::Receiver<SessionPhase> {
        self.phase.subscribe()
    }

    /// Loads a bundle image that is already in memory.
    pub async fn load_bytes(&self, bytes: &[u8]) -> Result<(), CorruptIndexError> {
        let result = self.client.lock().await.initialize(bytes);
        self.phase.send_replace(if result.is_ok() {
            SessionPhase::Ready
        } else {
            SessionPhase::Unavailable
        });
        result
    }

    /// Fetches a bundle from disk and loads it.
    pub async fn load_path(&self, path: &Path) -> Result<(), CorruptIndexError> {
        match tokio::fs::read(path).await {
            Ok(bytes) => self.load_bytes(&bytes).await,
            Err(e) => {
                let error = CorruptIndexError::Fetch(format!("{}: {}", path.display(), e));
                self.client.lock().await.mark_unavailable(error.clone());
                self.phase.send_replace(SessionPhase::Unavailable);
                Err(error)
            }
        }
    }

    /// Submits a query, superseding any query still in flight.
    pub async fn submit(&self, text: &str) -> Result<QueryOutcome, QueryError> {
        let (generation, cancelled) = self.supersede();

        let mut phase = self.phase.subscribe();
        if !phase.borrow().is_settled() {
            if self.policy == PendingPolicy::Reject {
                return Err(NotReadyError.into());
            }
            tracing::debug!("Queueing query '{}' until the search index is loaded", text);
            tokio::select! {
                () = cancelled.cancelled() => return Ok(QueryOutcome::Superseded),
                settled = phase.wait_for(|p| p.is_settled()) => {
                    if settled.is_err() {
                        return Err(NotReadyError.into());
                    }
                }
            }
        }

        if self.is_stale(generation) {
            return Ok(QueryOutcome::Superseded);
        }

        self.phase.send_if_modified(|phase| match phase {
            SessionPhase::Ready | SessionPhase::ResultsAvailable => {
                *phase = SessionPhase::Querying;
                true
            }
            _ => false,
        });

        let result = self.client.lock().await.query(text);

        if self.is_stale(generation) {
            tracing::trace!("Discarding stale results for '{}'", text);
            return Ok(QueryOutcome::Superseded);
        }

        let hits = result?;
        self.phase.send_if_modified(|phase| {
            if *phase == SessionPhase::Querying {
                *phase = SessionPhase::ResultsAvailable;
                true
            } else {
                false
            }
        });
        Ok(QueryOutcome::Results(hits))
    }

    /// Runs `f` against the loaded client, e.g. for suggestions or rendering.
    pub async fn with_client<R>(&self, f: impl FnOnce(&QueryClient) -> R) -> R {
        f(&*self.client.lock().await)
    }

    /// Starts a new generation and cancels whatever was waiting before it.
    fn supersede(&self) -> (u64, CancellationToken) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let token = CancellationToken::new();
        let previous = std::mem::replace(
            &mut *self
                .pending
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
            token.clone(),
        );
        previous.cancel();
        (generation, token)
    }

    fn is_stale(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) != generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::IndexBundle;
    use crate::entry::{EntryDraft, EntryKind};
    use crate::reference::ReferenceAssigner;
    use crate::search::build_index;
    use assert2::{check, let_assert};
    use std::sync::Arc;
    use std::time::Duration;

    fn bundle() -> Vec<u8> {
        let set = ReferenceAssigner::new().assign_all([EntryDraft {
            source_file: "guide".to_string(),
            kind: EntryKind::Title,
            object_type: String::new(),
            namespace_prefix: "install".to_string(),
            short_prefix: String::new(),
            name: "Installation".to_string(),
            display_name: "Installation".to_string(),
            anchor_id: String::new(),
        }]);
        IndexBundle::new(Some(build_index(&set)), &set)
            .to_json()
            .unwrap()
            .into_bytes()
    }

    #[tokio::test]
    async fn rejecting_session_fails_fast_before_load() {
        let session = SearchSession::new(PendingPolicy::Reject);
        check!(
            session.submit("install").await == Err(QueryError::NotReady(NotReadyError))
        );
        check!(session.phase() == SessionPhase::Uninitialized);
    }

    #[tokio::test]
    async fn queued_query_runs_once_loaded() {
        let session = Arc::new(SearchSession::new(PendingPolicy::Queue));
        let waiting = tokio::spawn({
            let session = Arc::clone(&session);
            async move { session.submit("install").await }
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        session.load_bytes(&bundle()).await.unwrap();

        let_assert!(Ok(Ok(QueryOutcome::Results(hits))) = waiting.await);
        check!(hits.len() == 1);
        check!(session.phase() == SessionPhase::ResultsAvailable);
    }

    #[tokio::test]
    async fn newer_query_supersedes_queued_one() {
        let session = Arc::new(SearchSession::new(PendingPolicy::Queue));
        let older = tokio::spawn({
            let session = Arc::clone(&session);
            async move { session.submit("instal").await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        let newer = tokio::spawn({
            let session = Arc::clone(&session);
            async move { session.submit("installation").await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        session.load_bytes(&bundle()).await.unwrap();

        let_assert!(Ok(Ok(QueryOutcome::Superseded)) = older.await);
        let_assert!(Ok(Ok(QueryOutcome::Results(hits))) = newer.await);
        check!(!hits.is_empty());
    }

    #[tokio::test]
    async fn missing_bundle_makes_session_unavailable() {
        let session = SearchSession::default();
        let_assert!(
            Err(CorruptIndexError::Fetch(_)) =
                session.load_path(Path::new("/nonexistent/lunrindex.json")).await
        );
        check!(session.phase() == SessionPhase::Unavailable);
        let_assert!(Err(QueryError::Unavailable(_)) = session.submit("install").await);
    }
}
