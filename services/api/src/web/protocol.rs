//! services/api/src/web/protocol.rs
//!
//! Defines the WebSocket message protocol between the browser console and the API server.

use crate::web::dto::{AnswerDto, DocumentDto, FiltersDto};
use serde::{Deserialize, Serialize};
use workspace_query_core::Query;

//=========================================================================================
// Messages Sent FROM the Client (Browser) TO the Server
//=========================================================================================

/// Represents the structured text messages a client can send to the server.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Filters the document list. Supersedes any submission still running.
    Search {
        #[serde(default)]
        query: String,
        #[serde(default)]
        filters: FiltersDto,
    },

    /// Asks the assistant a question. Follow-up prompts are sent the same way.
    Ask { query: String },

    /// Abandons the pending submission, if any.
    Cancel,
}

impl ClientMessage {
    /// The query this message submits, if it submits one.
    pub fn into_query(self) -> Option<Query> {
        match self {
            ClientMessage::Search { query, filters } => Some(Query::search(query, filters.into())),
            ClientMessage::Ask { query } => Some(Query::ask(query)),
            ClientMessage::Cancel => None,
        }
    }
}

//=========================================================================================
// Messages Sent FROM the Server TO the Client (Browser)
//=========================================================================================

/// Represents the structured text messages the server can send to the client.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The server accepted a submission and is working on it.
    Processing { sequence: u64, mode: String },

    /// A display-only progress line while an answer is being prepared.
    Status { sequence: u64, text: String },

    /// The documents matching a search, tagged with the submission's sequence number.
    SearchResults {
        sequence: u64,
        documents: Vec<DocumentDto>,
    },

    /// A synthesized answer, tagged with the submission's sequence number.
    Answer { sequence: u64, result: AnswerDto },

    /// Something failed. The client should display the message.
    ///
    /// `sequence` is absent when the frame could not be turned into a submission.
    Error {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sequence: Option<u64>,
        message: String,
    },

    /// Nothing is pending anymore; the UI can leave its "thinking" state.
    Idle,
}
