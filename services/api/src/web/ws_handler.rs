//! services/api/src/web/ws_handler.rs
//!
//! This is the main entry point and control loop for a console WebSocket connection.
//! Each connection owns one query session; every submission runs on its own task.

use crate::web::{
    console_task::{dispatch_message, send_message},
    protocol::{ClientMessage, ServerMessage},
    state::AppState,
};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::stream::{SplitSink, StreamExt};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;
use workspace_query_core::QuerySession;

type WsSender = Arc<Mutex<SplitSink<WebSocket, Message>>>;

/// The handler for upgrading HTTP requests to WebSocket connections.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state))
}

async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>) {
    let connection_id = Uuid::new_v4();
    info!("New console connection established: {}", connection_id);

    // The sender is wrapped in an Arc<Mutex<>> to allow for shared mutable access across tasks.
    let (sender, mut receiver) = socket.split();
    let ws_sender: WsSender = Arc::new(Mutex::new(sender));
    let session = Arc::new(QuerySession::new(app_state.engine.clone()));

    // --- Main Message Loop ---
    while let Some(Ok(msg)) = receiver.next().await {
        match msg {
            Message::Text(text) => {
                handle_text_message(text.as_str(), &session, &ws_sender).await;
            }
            Message::Close(_) => {
                info!("Client sent close message.");
                break;
            }
            _ => {}
        }
    }

    // --- Cleanup ---
    session.cancel();
    info!("Console connection {} closed.", connection_id);
}

/// Helper function to handle the logic for different `ClientMessage` variants.
///
/// Dispatch happens before this returns, so submissions are ordered as their frames arrived.
async fn handle_text_message(text: &str, session: &Arc<QuerySession>, ws_sender: &WsSender) {
    let client_msg = match serde_json::from_str::<ClientMessage>(text) {
        Ok(client_msg) => client_msg,
        Err(e) => {
            warn!("Failed to deserialize client message: {}", e);
            let err_msg = ServerMessage::Error {
                sequence: None,
                message: format!("Unrecognized message: {}", e),
            };
            send_message(ws_sender, &err_msg).await;
            return;
        }
    };

    dispatch_message(session, client_msg, ws_sender);
}
