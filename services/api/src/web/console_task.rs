//! services/api/src/web/console_task.rs
//!
//! This module contains the asynchronous "worker" function responsible for
//! running a single console submission and streaming its progress to the client,
//! plus the dispatcher that orders submissions before handing them to a worker.

use crate::web::{
    dto::{documents_to_dto, AnswerDto},
    protocol::{ClientMessage, ServerMessage},
};
use axum::extract::ws::Message;
use futures::{Sink, SinkExt};
use std::sync::Arc;
use tokio::{
    sync::{mpsc, Mutex},
    task::JoinHandle,
};
use tracing::{debug, error, info, warn};
use workspace_query_core::{
    QueryError, QueryOutcome, QueryResponse, QuerySession, SearchMode, Submission,
};

/// Serializes `msg` and sends it as a text frame. Returns `false` if the client is gone.
pub async fn send_message<S>(ws_sender: &Arc<Mutex<S>>, msg: &ServerMessage) -> bool
where
    S: Sink<Message> + Unpin,
{
    let json = match serde_json::to_string(msg) {
        Ok(json) => json,
        Err(e) => {
            error!("Failed to serialize server message: {}", e);
            return false;
        }
    };
    ws_sender
        .lock()
        .await
        .send(Message::Text(json.into()))
        .await
        .is_ok()
}

/// Acts on one parsed client frame.
///
/// Submissions are ordered with [`QuerySession::begin`] before their worker is
/// spawned, so frames are numbered in arrival order regardless of task scheduling.
pub fn dispatch_message<S>(
    session: &Arc<QuerySession>,
    client_msg: ClientMessage,
    ws_sender: &Arc<Mutex<S>>,
) -> Option<JoinHandle<()>>
where
    S: Sink<Message> + Unpin + Send + 'static,
{
    let Some(query) = client_msg.into_query() else {
        info!("Cancel message received.");
        session.cancel();
        return None;
    };

    match session.begin(query) {
        Ok(submission) => {
            info!(
                "Console submission {} received ({:?}).",
                submission.sequence(),
                submission.query().mode
            );
            Some(tokio::spawn(run_submission(
                session.clone(),
                submission,
                ws_sender.clone(),
            )))
        }
        Err(e) => {
            warn!("Rejected console submission: {}", e);
            let ws_sender = ws_sender.clone();
            Some(tokio::spawn(async move {
                let msg = ServerMessage::Error {
                    sequence: None,
                    message: e.to_string(),
                };
                send_message(&ws_sender, &msg).await;
            }))
        }
    }
}

/// Runs an ordered submission through the connection's session, forwarding status
/// lines as they arrive.
///
/// Superseded submissions end silently; the newer submission reports for them.
pub async fn run_submission<S>(
    session: Arc<QuerySession>,
    submission: Submission,
    ws_sender: Arc<Mutex<S>>,
) where
    S: Sink<Message> + Unpin,
{
    let current = submission.sequence();
    let mode = match submission.query().mode {
        SearchMode::Search => "search",
        SearchMode::Ask => "ask",
    };
    let processing = ServerMessage::Processing {
        sequence: current,
        mode: mode.to_string(),
    };
    send_message(&ws_sender, &processing).await;

    let (status_tx, mut status_rx) = mpsc::unbounded_channel::<String>();
    let run = session.run(submission, Some(&status_tx));
    tokio::pin!(run);

    let result = loop {
        tokio::select! {
            result = &mut run => break result,
            Some(text) = status_rx.recv() => {
                let status = ServerMessage::Status { sequence: current, text };
                if !send_message(&ws_sender, &status).await {
                    warn!("Failed to send status update. Client may have disconnected.");
                }
            }
        }
    };
    while let Ok(text) = status_rx.try_recv() {
        send_message(&ws_sender, &ServerMessage::Status { sequence: current, text }).await;
    }

    let reply = match result {
        Ok(QueryResponse {
            sequence,
            outcome: QueryOutcome::Documents(documents),
        }) => {
            info!("Submission {} returned {} documents.", sequence, documents.len());
            ServerMessage::SearchResults {
                sequence,
                documents: documents_to_dto(&documents),
            }
        }
        Ok(QueryResponse {
            sequence,
            outcome: QueryOutcome::Answer(answer),
        }) => {
            info!("Submission {} answered with {} sources.", sequence, answer.sources.len());
            ServerMessage::Answer {
                sequence,
                result: AnswerDto::from(answer),
            }
        }
        Err(QueryError::Superseded { sequence }) => {
            debug!("Submission {} superseded; nothing to report.", sequence);
            return;
        }
        Err(QueryError::Cancelled) => {
            info!("Submission {} cancelled by the client.", current);
            send_message(&ws_sender, &ServerMessage::Idle).await;
            return;
        }
        Err(e) => {
            error!("Console submission {} failed: {}", current, e);
            ServerMessage::Error {
                sequence: Some(current),
                message: e.to_string(),
            }
        }
    };

    if !send_message(&ws_sender, &reply).await {
        warn!("Failed to send submission result. Client may have disconnected.");
        return;
    }
    if !session.is_processing() {
        send_message(&ws_sender, &ServerMessage::Idle).await;
    }
}
