//! crates/workspace_query_core/src/session.rs
//!
//! Per-view query state. A session tags every submission with a sequence number,
//! cancels the previous submission when a new one arrives, and discards results
//! that are no longer the latest, so the most recent request always wins.
//!
//! Submitting is split in two: [`QuerySession::begin`] is synchronous and fixes the
//! submission's place in the order; [`QuerySession::run`] does the work and may be
//! moved onto another task.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::domain::{Query, QueryOutcome, SearchMode};
use crate::engine::{QueryEngine, QueryError, QueryResult, StatusSender};

/// A resolved submission, tagged with the sequence number it was issued under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResponse {
    pub sequence: u64,
    pub outcome: QueryOutcome,
}

/// Keeps the in-flight counter accurate on every exit path, including drop.
struct InFlight(Arc<AtomicUsize>);

impl InFlight {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter.clone())
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A query that has been ordered by [`QuerySession::begin`] but not yet run.
///
/// The session counts it as processing from the moment it is created until it is
/// run to completion or dropped.
pub struct Submission {
    sequence: u64,
    query: Query,
    token: CancellationToken,
    _in_flight: InFlight,
}

impl Submission {
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn query(&self) -> &Query {
        &self.query
    }
}

pub struct QuerySession {
    engine: Arc<QueryEngine>,
    latest: AtomicU64,
    in_flight: Arc<AtomicUsize>,
    current: Mutex<CancellationToken>,
}

impl QuerySession {
    pub fn new(engine: Arc<QueryEngine>) -> Self {
        Self {
            engine,
            latest: AtomicU64::new(0),
            in_flight: Arc::new(AtomicUsize::new(0)),
            current: Mutex::new(CancellationToken::new()),
        }
    }

    /// True while any submission of this session has not yet resolved.
    pub fn is_processing(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// The sequence number of the most recent submission, 0 before the first one.
    pub fn latest_sequence(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    /// Aborts the pending submission, if any. Used when the view goes away.
    pub fn cancel(&self) {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .cancel();
    }

    /// Makes `query` the newest submission and cancels the one before it.
    ///
    /// Blank `Ask` queries are rejected here, before they disturb any pending submission.
    pub fn begin(&self, query: Query) -> QueryResult<Submission> {
        if query.mode == SearchMode::Ask && query.text.trim().is_empty() {
            return Err(QueryError::InvalidQuery);
        }

        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        current.cancel();
        let token = CancellationToken::new();
        *current = token.clone();
        let sequence = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("Submission {} started ({:?})", sequence, query.mode);

        Ok(Submission {
            sequence,
            query,
            token,
            _in_flight: InFlight::enter(&self.in_flight),
        })
    }

    /// Runs a submission created by [`QuerySession::begin`].
    ///
    /// Resolves as `Superseded` if a newer submission was begun in the meantime.
    pub async fn run(
        &self,
        submission: Submission,
        status: Option<&StatusSender>,
    ) -> QueryResult<QueryResponse> {
        let sequence = submission.sequence;
        let result = tokio::select! {
            biased;
            _ = submission.token.cancelled() => None,
            outcome = self.engine.run(&submission.query, status) => Some(outcome),
        };

        if self.latest_sequence() != sequence {
            debug!("Submission {} superseded; discarding its result", sequence);
            return Err(QueryError::Superseded { sequence });
        }

        match result {
            Some(outcome) => outcome.map(|outcome| QueryResponse { sequence, outcome }),
            None => {
                debug!("Submission {} cancelled", sequence);
                Err(QueryError::Cancelled)
            }
        }
    }

    /// [`QuerySession::begin`] followed by [`QuerySession::run`].
    pub async fn submit(
        &self,
        query: Query,
        status: Option<&StatusSender>,
    ) -> QueryResult<QueryResponse> {
        let submission = self.begin(query)?;
        self.run(submission, status).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SearchFilters;
    use crate::engine::EngineTiming;
    use crate::fixtures::StaticWorkspace;
    use crate::mock::MockSynthesizer;
    use crate::ports::{AnswerSynthesizer, PortError, PortResult, WorkspaceStore};
    use async_trait::async_trait;
    use std::time::Duration;
    use tokio::time::sleep;

    struct FailingSynthesizer;

    #[async_trait]
    impl AnswerSynthesizer for FailingSynthesizer {
        async fn synthesize(&self, _query: &str, _context: &str) -> PortResult<String> {
            Err(PortError::Unavailable("network error".to_string()))
        }
    }

    fn session_with(synthesizer: Option<Arc<dyn AnswerSynthesizer>>) -> Arc<QuerySession> {
        let store: Arc<dyn WorkspaceStore> = Arc::new(StaticWorkspace::demo());
        let synthesizer =
            synthesizer.unwrap_or_else(|| Arc::new(MockSynthesizer::seeded(store.clone(), 1)));
        let engine = QueryEngine::new(store, synthesizer, EngineTiming::default());
        Arc::new(QuerySession::new(Arc::new(engine)))
    }

    #[tokio::test(start_paused = true)]
    async fn processing_flag_tracks_a_submission() {
        let session = session_with(None);
        assert!(!session.is_processing());

        let task = {
            let session = session.clone();
            tokio::spawn(async move { session.submit(Query::ask("summarize this"), None).await })
        };
        sleep(Duration::from_millis(100)).await;
        assert!(session.is_processing());

        let response = task.await.unwrap().unwrap();
        assert_eq!(response.sequence, 1);
        assert!(matches!(response.outcome, QueryOutcome::Answer(_)));
        assert!(!session.is_processing());
    }

    #[tokio::test(start_paused = true)]
    async fn failure_clears_processing_flag() {
        let session = session_with(Some(Arc::new(FailingSynthesizer)));
        let err = session
            .submit(Query::ask("summarize this"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::SynthesizerUnavailable(_)));
        assert!(!session.is_processing());
    }

    #[tokio::test(start_paused = true)]
    async fn newer_submission_wins_over_slower_older_one() {
        let session = session_with(None);

        let slow_ask = {
            let session = session.clone();
            tokio::spawn(async move { session.submit(Query::ask("summarize this"), None).await })
        };
        sleep(Duration::from_millis(100)).await;

        let search = session
            .submit(Query::search("roadmap", SearchFilters::default()), None)
            .await
            .unwrap();
        assert_eq!(search.sequence, 2);
        match search.outcome {
            QueryOutcome::Documents(docs) => assert_eq!(docs.len(), 1),
            other => panic!("unexpected outcome: {other:?}"),
        }

        let err = slow_ask.await.unwrap().unwrap_err();
        assert!(matches!(err, QueryError::Superseded { sequence: 1 }));
        assert!(!session.is_processing());
    }

    #[tokio::test(start_paused = true)]
    async fn explicit_cancel_resolves_pending_submission() {
        let session = session_with(None);
        let task = {
            let session = session.clone();
            tokio::spawn(async move { session.submit(Query::ask("summarize this"), None).await })
        };
        sleep(Duration::from_millis(1000)).await;
        session.cancel();

        let err = task.await.unwrap().unwrap_err();
        assert!(matches!(err, QueryError::Cancelled));
        assert!(!session.is_processing());
    }

    #[tokio::test(start_paused = true)]
    async fn blank_ask_does_not_disturb_pending_submission() {
        let session = session_with(None);
        let task = {
            let session = session.clone();
            tokio::spawn(async move {
                session
                    .submit(Query::search("", SearchFilters::default()), None)
                    .await
            })
        };
        sleep(Duration::from_millis(10)).await;

        let err = session.submit(Query::ask("  "), None).await.unwrap_err();
        assert!(matches!(err, QueryError::InvalidQuery));
        assert_eq!(session.latest_sequence(), 1);

        let response = task.await.unwrap().unwrap();
        match response.outcome {
            QueryOutcome::Documents(docs) => assert_eq!(docs.len(), 4),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn submissions_begun_back_to_back_keep_their_order() {
        let store: Arc<dyn WorkspaceStore> = Arc::new(StaticWorkspace::demo());
        let engine = QueryEngine::new(
            store.clone(),
            Arc::new(MockSynthesizer::seeded(store, 5)),
            EngineTiming {
                search_delay: Duration::from_millis(20),
                ask_delay: Duration::from_millis(50),
                status_interval: Duration::from_millis(10),
            },
        );
        let session = Arc::new(QuerySession::new(Arc::new(engine)));

        let ask = session.begin(Query::ask("summarize this")).unwrap();
        let ask_task = {
            let session = session.clone();
            tokio::spawn(async move { session.run(ask, None).await })
        };
        let search = session
            .begin(Query::search("roadmap", SearchFilters::default()))
            .unwrap();
        let search_task = {
            let session = session.clone();
            tokio::spawn(async move { session.run(search, None).await })
        };

        let err = ask_task.await.unwrap().unwrap_err();
        assert!(matches!(err, QueryError::Superseded { sequence: 1 }));
        let response = search_task.await.unwrap().unwrap();
        assert_eq!(response.sequence, 2);
        match response.outcome {
            QueryOutcome::Documents(docs) => assert_eq!(docs[0].name, "Product Roadmap 2024"),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(!session.is_processing());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_between_begin_and_run_still_applies() {
        let session = session_with(None);
        let submission = session.begin(Query::ask("summarize this")).unwrap();
        assert_eq!(submission.sequence(), 1);
        assert!(session.is_processing());

        session.cancel();
        let err = session.run(submission, None).await.unwrap_err();
        assert!(matches!(err, QueryError::Cancelled));
        assert!(!session.is_processing());
    }

    #[tokio::test]
    async fn dropped_submission_is_no_longer_processing() {
        let session = session_with(None);
        let submission = session.begin(Query::search("", SearchFilters::default())).unwrap();
        assert!(session.is_processing());
        drop(submission);
        assert!(!session.is_processing());
    }
}
