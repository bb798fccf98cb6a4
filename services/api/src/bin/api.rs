//! services/api/src/bin/api.rs

use api_lib::{
    config::Config,
    error::ApiError,
    web::{
        ask_handler, facets_handler, get_collection_handler, get_document_handler,
        list_activities_handler,
        list_collections_handler, list_documents_handler, list_members_handler,
        resolve_activity_handler, rest::ApiDoc, search_handler, state::AppState, ws_handler,
    },
};
use axum::http::{header::{ACCEPT, CONTENT_TYPE}, HeaderValue, Method};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Build the Query Engine & Shared AppState ---
    let app_state = Arc::new(AppState::new(config.clone()));
    info!(
        "Query engine ready with {} documents.",
        app_state.engine.store().documents().len()
    );

    let cors_origin = config.cors_origin.parse::<HeaderValue>().map_err(|e| {
        ApiError::Internal(format!("Invalid CORS origin '{}': {}", config.cors_origin, e))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(cors_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT]);

    // --- 3. Create the Web Router ---
    let api_router = Router::new()
        .route("/documents", get(list_documents_handler))
        .route("/documents/{id}", get(get_document_handler))
        .route("/collections", get(list_collections_handler))
        .route("/collections/{id}", get(get_collection_handler))
        .route("/members", get(list_members_handler))
        .route("/activities", get(list_activities_handler))
        .route("/activities/{id}/document", get(resolve_activity_handler))
        .route("/search/facets", get(facets_handler))
        .route("/search", post(search_handler))
        .route("/ask", post(ask_handler))
        .route("/ws", get(ws_handler))
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 4. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
