//! crates/workspace_query_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the query engine.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of where documents come from and how answers are produced.

use async_trait::async_trait;

use crate::domain::{Activity, Collection, Document, Member};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., network, auth).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Service unavailable: {0}")]
    Unavailable(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Read-only access to the workspace snapshot.
///
/// Implementations hand out borrowed slices; the snapshot never changes for the
/// lifetime of the store, so no locking is involved.
pub trait WorkspaceStore: Send + Sync {
    /// All documents, in insertion order.
    fn documents(&self) -> &[Document];

    fn collections(&self) -> &[Collection];

    fn members(&self) -> &[Member];

    fn activities(&self) -> &[Activity];

    fn document_by_id(&self, id: &str) -> Option<&Document> {
        self.documents().iter().find(|doc| doc.id == id)
    }

    fn collection_by_id(&self, id: &str) -> Option<&Collection> {
        self.collections().iter().find(|collection| collection.id == id)
    }
}

#[async_trait]
pub trait AnswerSynthesizer: Send + Sync {
    /// Produces answer text for a question, given a flattened description of the workspace.
    async fn synthesize(&self, query: &str, context: &str) -> PortResult<String>;
}
