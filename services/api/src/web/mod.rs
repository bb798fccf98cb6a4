pub mod console_task;
pub mod dto;
pub mod protocol;
pub mod rest;
pub mod state;
pub mod ws_handler;

// Re-export the main WebSocket handler to make it easily accessible
// to the binary that will build the web server router.
pub use ws_handler::ws_handler;
pub use rest::{
    ask_handler, facets_handler, get_collection_handler, get_document_handler,
    list_activities_handler,
    list_collections_handler, list_documents_handler, list_members_handler,
    resolve_activity_handler, search_handler,
};
