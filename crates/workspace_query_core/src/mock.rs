//! crates/workspace_query_core/src/mock.rs
//!
//! The local, network-free answer synthesizer. It picks a document from the
//! workspace at random and drops it into one of a few canned templates.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::domain::Document;
use crate::ports::{AnswerSynthesizer, PortError, PortResult, WorkspaceStore};

const EMPTY_WORKSPACE_ANSWER: &str =
    "Your workspace doesn't contain any documents yet, so there is nothing to analyze.";

pub struct MockSynthesizer {
    store: Arc<dyn WorkspaceStore>,
    rng: Mutex<StdRng>,
}

impl MockSynthesizer {
    pub fn new(store: Arc<dyn WorkspaceStore>) -> Self {
        Self::with_rng(store, StdRng::from_os_rng())
    }

    /// Deterministic variant for tests and reproducible demos.
    pub fn seeded(store: Arc<dyn WorkspaceStore>, seed: u64) -> Self {
        Self::with_rng(store, StdRng::seed_from_u64(seed))
    }

    fn with_rng(store: Arc<dyn WorkspaceStore>, rng: StdRng) -> Self {
        Self {
            store,
            rng: Mutex::new(rng),
        }
    }
}

fn render_template(index: usize, mention: &Document) -> String {
    match index {
        0 => format!(
            "Based on your workspace documents, specifically \"{}\", I've analyzed that your current project trajectory aligns with the Q4 goals. The primary bottlenecks identified involve cross-team dependency resolution.",
            mention.name
        ),
        1 => format!(
            "According to the data in \"{}\" authored by {}, the engineering standards require an update to support the new schema definitions. I recommend reviewing the latest PR for action items.",
            mention.name, mention.owner
        ),
        _ => format!(
            "I've synthesized the recent activity in your collections. It appears that most updates are focused on \"{}\". The overall sentiment of the documentation suggests a high state of readiness for the upcoming deployment.",
            mention.name
        ),
    }
}

const TEMPLATE_COUNT: usize = 3;

#[async_trait]
impl AnswerSynthesizer for MockSynthesizer {
    async fn synthesize(&self, _query: &str, _context: &str) -> PortResult<String> {
        let documents = self.store.documents();
        if documents.is_empty() {
            return Ok(EMPTY_WORKSPACE_ANSWER.to_string());
        }

        let (doc_index, template_index) = {
            let mut rng = self
                .rng
                .lock()
                .map_err(|e| PortError::Unexpected(e.to_string()))?;
            (
                rng.random_range(0..documents.len()),
                rng.random_range(0..TEMPLATE_COUNT),
            )
        };

        Ok(render_template(template_index, &documents[doc_index]))
    }
}
