//! crates/workspace_query_core/src/engine.rs
//!
//! The workspace query engine: substring search over the document snapshot and
//! the staged "thinking" sequence that resolves a synthesized answer.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};
use tracing::{info, warn};

use crate::domain::{
    AnswerResult, Collection, Document, Facets, Query, QueryOutcome, SearchFilters, SearchMode,
    Source, ALL,
};
use crate::ports::{AnswerSynthesizer, WorkspaceStore};

/// Display-only progress messages emitted while an answer is being prepared.
pub const STATUS_STEPS: [&str; 6] = [
    "Initializing Nexus Neural Engine...",
    "Scanning document workspace...",
    "Cross-referencing metadata...",
    "Applying semantic filters...",
    "Synthesizing knowledge clusters...",
    "Finalizing response...",
];

const FIXED_FOLLOW_UPS: [&str; 2] = ["Show related documents", "Identify key stakeholders"];

/// Receives status strings while `ask` is running. Send failures are ignored.
pub type StatusSender = mpsc::UnboundedSender<String>;

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("Query text must not be empty")]
    InvalidQuery,
    #[error("Answer synthesizer unavailable: {0}")]
    SynthesizerUnavailable(String),
    #[error("Query was cancelled")]
    Cancelled,
    #[error("Query {sequence} was superseded by a newer submission")]
    Superseded { sequence: u64 },
}

pub type QueryResult<T> = Result<T, QueryError>;

/// Simulated latencies of the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineTiming {
    pub search_delay: Duration,
    pub ask_delay: Duration,
    pub status_interval: Duration,
}

impl Default for EngineTiming {
    fn default() -> Self {
        Self {
            search_delay: Duration::from_millis(600),
            ask_delay: Duration::from_millis(3200),
            status_interval: Duration::from_millis(600),
        }
    }
}

pub struct QueryEngine {
    store: Arc<dyn WorkspaceStore>,
    synthesizer: Arc<dyn AnswerSynthesizer>,
    timing: EngineTiming,
}

impl QueryEngine {
    pub fn new(
        store: Arc<dyn WorkspaceStore>,
        synthesizer: Arc<dyn AnswerSynthesizer>,
        timing: EngineTiming,
    ) -> Self {
        Self {
            store,
            synthesizer,
            timing,
        }
    }

    pub fn store(&self) -> &dyn WorkspaceStore {
        self.store.as_ref()
    }

    pub fn timing(&self) -> EngineTiming {
        self.timing
    }

    /// Filter options for the search console, derived from the current snapshot.
    pub fn facets(&self) -> Facets {
        facets(self.store.documents())
    }

    /// Maps an activity feed entry onto the document it refers to.
    ///
    /// Targets that don't name a known document fall back to the first document.
    pub fn resolve_activity(&self, activity_id: &str) -> Option<&Document> {
        let activity = self
            .store
            .activities()
            .iter()
            .find(|activity| activity.id == activity_id)?;
        let documents = self.store.documents();
        documents
            .iter()
            .find(|doc| doc.name == activity.target)
            .or_else(|| documents.first())
    }

    /// Looks up a collection for the detail view.
    ///
    /// Unknown ids fall back to the first collection, as the collection page does.
    pub fn resolve_collection(&self, collection_id: &str) -> Option<&Collection> {
        self.store
            .collection_by_id(collection_id)
            .or_else(|| self.store.collections().first())
    }

    /// Returns every document whose name contains `query` (case-insensitively)
    /// and which passes `filters`, in store order.
    pub async fn search(&self, query: &str, filters: &SearchFilters) -> Vec<Document> {
        let started = Instant::now();
        sleep(self.timing.search_delay).await;
        let documents = filter_documents(self.store.documents(), query, filters);
        info!(
            "Search for '{}' matched {} documents in {:?}",
            query,
            documents.len(),
            started.elapsed()
        );
        documents
    }

    /// Produces an answer for `query`, emitting status strings on `status` while waiting.
    ///
    /// Resolves only after both the thinking delay and the synthesizer have finished.
    pub async fn ask(
        &self,
        query: &str,
        status: Option<&StatusSender>,
    ) -> QueryResult<AnswerResult> {
        let query = query.trim();
        if query.is_empty() {
            return Err(QueryError::InvalidQuery);
        }

        let started = Instant::now();
        info!("Ask started for '{}'", query);
        let documents = self.store.documents();
        let context = flatten_context(documents);

        let work = async {
            let (_, text) = tokio::join!(
                sleep(self.timing.ask_delay),
                self.synthesizer.synthesize(query, &context)
            );
            text
        };
        tokio::pin!(work);

        let period = self.timing.status_interval.max(Duration::from_millis(1));
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut step = 0usize;

        let text = loop {
            tokio::select! {
                biased;
                text = &mut work => break text,
                _ = ticker.tick() => {
                    if let Some(status) = status {
                        let _ = status.send(STATUS_STEPS[step % STATUS_STEPS.len()].to_string());
                    }
                    step += 1;
                }
            }
        };

        let text = text.map_err(|e| {
            warn!("Answer synthesis failed for '{}': {}", query, e);
            QueryError::SynthesizerUnavailable(e.to_string())
        })?;

        let sources = cite_sources(&text, documents);
        let follow_ups = follow_ups(&sources);
        info!(
            "Ask resolved with {} sources in {:?}",
            sources.len(),
            started.elapsed()
        );

        Ok(AnswerResult {
            text,
            sources,
            follow_ups,
        })
    }

    /// Dispatches a query to `search` or `ask` according to its mode.
    pub async fn run(
        &self,
        query: &Query,
        status: Option<&StatusSender>,
    ) -> QueryResult<QueryOutcome> {
        match query.mode {
            SearchMode::Search => Ok(QueryOutcome::Documents(
                self.search(&query.text, &query.filters).await,
            )),
            SearchMode::Ask => self.ask(&query.text, status).await.map(QueryOutcome::Answer),
        }
    }
}

/// The pure half of `search`. A blank query matches every name.
pub fn filter_documents(documents: &[Document], query: &str, filters: &SearchFilters) -> Vec<Document> {
    let needle = query.to_lowercase();
    let match_all = query.trim().is_empty();
    documents
        .iter()
        .filter(|doc| match_all || doc.name.to_lowercase().contains(&needle))
        .filter(|doc| filters.matches(doc))
        .cloned()
        .collect()
}

/// Every document whose name appears verbatim (case-sensitively) in `text`, in store order.
pub fn extract_sources(text: &str, documents: &[Document]) -> Vec<Source> {
    documents
        .iter()
        .filter(|doc| text.contains(doc.name.as_str()))
        .map(|doc| Source {
            title: doc.name.clone(),
        })
        .collect()
}

/// [`extract_sources`], falling back to the first document when nothing matched.
pub fn cite_sources(text: &str, documents: &[Document]) -> Vec<Source> {
    let sources = extract_sources(text, documents);
    if !sources.is_empty() {
        return sources;
    }
    documents
        .first()
        .map(|doc| {
            vec![Source {
                title: doc.name.clone(),
            }]
        })
        .unwrap_or_default()
}

pub fn follow_ups(sources: &[Source]) -> Vec<String> {
    let mut prompts = Vec::with_capacity(FIXED_FOLLOW_UPS.len() + 1);
    if let Some(first) = sources.first() {
        prompts.push(format!("Summarize {}", first.title));
    }
    prompts.extend(FIXED_FOLLOW_UPS.iter().map(|p| p.to_string()));
    prompts
}

/// One line per document, used as synthesizer context.
pub fn flatten_context(documents: &[Document]) -> String {
    documents
        .iter()
        .map(|doc| {
            let mut line = format!(
                "- \"{}\" ({}) owned by {}, last updated {}",
                doc.name, doc.doc_type, doc.owner, doc.last_updated
            );
            if let Some(snippet) = &doc.content_snippet {
                line.push_str(": ");
                line.push_str(snippet);
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn facets(documents: &[Document]) -> Facets {
    let mut types = vec![ALL.to_string()];
    let mut owners = vec![ALL.to_string()];
    for doc in documents {
        if !types.contains(&doc.doc_type) {
            types.push(doc.doc_type.clone());
        }
        if !owners.contains(&doc.owner) {
            owners.push(doc.owner.clone());
        }
    }
    Facets { types, owners }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::StaticWorkspace;
    use crate::mock::MockSynthesizer;
    use crate::ports::{PortError, PortResult};
    use async_trait::async_trait;

    struct FixedSynthesizer(&'static str);

    #[async_trait]
    impl AnswerSynthesizer for FixedSynthesizer {
        async fn synthesize(&self, _query: &str, _context: &str) -> PortResult<String> {
            Ok(self.0.to_string())
        }
    }

    struct FailingSynthesizer;

    #[async_trait]
    impl AnswerSynthesizer for FailingSynthesizer {
        async fn synthesize(&self, _query: &str, _context: &str) -> PortResult<String> {
            Err(PortError::Unavailable("connection refused".to_string()))
        }
    }

    fn demo_engine(synthesizer: Arc<dyn AnswerSynthesizer>) -> QueryEngine {
        QueryEngine::new(
            Arc::new(StaticWorkspace::demo()),
            synthesizer,
            EngineTiming::default(),
        )
    }

    fn names(documents: &[Document]) -> Vec<&str> {
        documents.iter().map(|d| d.name.as_str()).collect()
    }

    #[test]
    fn search_matches_names_case_insensitively() {
        let workspace = StaticWorkspace::demo();
        let docs = workspace.documents();
        let found = filter_documents(docs, "roadmap", &SearchFilters::default());
        assert_eq!(names(&found), vec!["Product Roadmap 2024"]);

        let found = filter_documents(docs, "ON", &SearchFilters::default());
        for doc in docs {
            let expected = doc.name.to_lowercase().contains("on");
            assert_eq!(found.contains(doc), expected, "{}", doc.name);
        }
    }

    #[test]
    fn filters_intersect_with_name_match() {
        let workspace = StaticWorkspace::demo();
        let docs = workspace.documents();

        let pdfs = filter_documents(docs, "", &SearchFilters::new(Some("PDF".into()), None));
        assert_eq!(names(&pdfs), vec!["Product Roadmap 2024", "Engineering Onboarding"]);

        let filters = SearchFilters::new(Some("PDF".into()), Some("Alex Chen".into()));
        let found = filter_documents(docs, "o", &filters);
        assert_eq!(names(&found), vec!["Engineering Onboarding"]);

        let filters = SearchFilters::new(Some("SQL".into()), Some("Alex Chen".into()));
        assert!(filter_documents(docs, "", &filters).is_empty());
    }

    #[test]
    fn blank_query_returns_store_in_order() {
        let workspace = StaticWorkspace::demo();
        let docs = workspace.documents();
        assert_eq!(filter_documents(docs, "", &SearchFilters::default()), docs.to_vec());
        assert_eq!(filter_documents(docs, "   ", &SearchFilters::default()), docs.to_vec());
    }

    #[test]
    fn no_match_or_empty_store_yields_empty_result() {
        let workspace = StaticWorkspace::demo();
        assert!(filter_documents(workspace.documents(), "zzz-no-match", &SearchFilters::default()).is_empty());
        assert!(filter_documents(&[], "", &SearchFilters::default()).is_empty());
    }

    #[test]
    fn sources_are_substrings_or_single_fallback() {
        let workspace = StaticWorkspace::demo();
        let docs = workspace.documents();

        let text = "Compare \"Schema Definition\" with Branding Guidelines please.";
        let sources = cite_sources(text, docs);
        assert_eq!(sources.len(), 2);
        assert!(sources.iter().all(|s| text.contains(&s.title)));
        assert_eq!(sources[0].title, "Branding Guidelines");

        let sources = cite_sources("nothing relevant, schema definition", docs);
        assert_eq!(sources, vec![Source { title: "Product Roadmap 2024".to_string() }]);

        assert!(cite_sources("anything", &[]).is_empty());
    }

    #[test]
    fn follow_ups_lead_with_first_source() {
        let sources = vec![Source { title: "Branding Guidelines".to_string() }];
        assert_eq!(
            follow_ups(&sources),
            vec![
                "Summarize Branding Guidelines",
                "Show related documents",
                "Identify key stakeholders"
            ]
        );
        assert_eq!(follow_ups(&[]).len(), 2);
    }

    #[test]
    fn facets_are_deduplicated_in_store_order() {
        let workspace = StaticWorkspace::demo();
        let facets = facets(workspace.documents());
        assert_eq!(facets.types, vec!["All", "PDF", "DOCX", "SQL"]);
        assert_eq!(
            facets.owners,
            vec!["All", "Alex Rivera", "Sarah Chen", "Alex Chen", "Marc V."]
        );
    }

    #[test]
    fn activities_resolve_to_documents_with_fallback() {
        let engine = demo_engine(Arc::new(FixedSynthesizer("")));
        // None of the demo activity targets name a document.
        assert_eq!(engine.resolve_activity("a1").map(|d| d.id.as_str()), Some("d1"));
        assert!(engine.resolve_activity("missing").is_none());
    }

    #[test]
    fn collections_resolve_by_id_with_fallback() {
        let engine = demo_engine(Arc::new(FixedSynthesizer("")));
        assert_eq!(
            engine.resolve_collection("c3").map(|c| c.name.as_str()),
            Some("Research Library")
        );
        assert_eq!(engine.resolve_collection("c99").map(|c| c.id.as_str()), Some("c1"));

        let empty = QueryEngine::new(
            Arc::new(StaticWorkspace::default()),
            Arc::new(FixedSynthesizer("")),
            EngineTiming::default(),
        );
        assert!(empty.resolve_collection("c1").is_none());
    }

    #[test]
    fn context_lists_every_document() {
        let workspace = StaticWorkspace::demo();
        let context = flatten_context(workspace.documents());
        assert_eq!(context.lines().count(), 4);
        assert!(context.contains("\"Schema Definition\" (SQL) owned by Marc V."));
    }

    #[tokio::test(start_paused = true)]
    async fn search_waits_for_the_simulated_delay() {
        let engine = demo_engine(Arc::new(FixedSynthesizer("")));
        let started = Instant::now();
        let first = engine.search("roadmap", &SearchFilters::default()).await;
        assert!(started.elapsed() >= Duration::from_millis(600));
        let second = engine.search("roadmap", &SearchFilters::default()).await;
        assert_eq!(first, second);
        assert_eq!(names(&first), vec!["Product Roadmap 2024"]);
    }

    #[tokio::test(start_paused = true)]
    async fn mock_answer_cites_the_mentioned_document() {
        let store: Arc<dyn WorkspaceStore> = Arc::new(StaticWorkspace::demo());
        let engine = QueryEngine::new(
            store.clone(),
            Arc::new(MockSynthesizer::seeded(store, 3)),
            EngineTiming::default(),
        );

        let answer = engine.ask("summarize this", None).await.unwrap();
        assert!(!answer.sources.is_empty());
        assert!(answer.text.contains(&answer.sources[0].title));
        assert_eq!(answer.follow_ups.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn ask_emits_status_steps_until_resolved() {
        let engine = demo_engine(Arc::new(FixedSynthesizer("See Branding Guidelines.")));
        let (tx, mut rx) = mpsc::unbounded_channel();

        let answer = engine.ask("what changed?", Some(&tx)).await.unwrap();
        assert_eq!(answer.sources, vec![Source { title: "Branding Guidelines".to_string() }]);

        drop(tx);
        let mut statuses = Vec::new();
        while let Some(status) = rx.recv().await {
            statuses.push(status);
        }
        // 3200ms of thinking at a 600ms interval.
        assert_eq!(statuses, STATUS_STEPS[..5].to_vec());
    }

    #[tokio::test(start_paused = true)]
    async fn ask_rejects_blank_queries_immediately() {
        let engine = demo_engine(Arc::new(FixedSynthesizer("")));
        let started = Instant::now();
        let err = engine.ask("   ", None).await.unwrap_err();
        assert!(matches!(err, QueryError::InvalidQuery));
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn synthesizer_failure_surfaces_as_unavailable() {
        let engine = demo_engine(Arc::new(FailingSynthesizer));
        let err = engine.ask("summarize this", None).await.unwrap_err();
        match err {
            QueryError::SynthesizerUnavailable(message) => {
                assert!(message.contains("connection refused"))
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
