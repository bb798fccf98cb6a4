//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::{
    error::ApiError,
    web::{
        dto::{
            documents_to_dto, ActivityDto, AnswerDto, CollectionDto, DocumentDto, FacetsDto,
            FiltersDto, MemberDto,
        },
        state::AppState,
    },
};
use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::{OpenApi, ToSchema};
use workspace_query_core::PortError;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        list_documents_handler,
        get_document_handler,
        list_collections_handler,
        get_collection_handler,
        list_members_handler,
        list_activities_handler,
        resolve_activity_handler,
        facets_handler,
        search_handler,
        ask_handler,
    ),
    components(
        schemas(
            DocumentDto, CollectionDto, MemberDto, ActivityDto, FacetsDto, FiltersDto,
            AnswerDto, SearchRequest, SearchResponse, AskRequest
        )
    ),
    tags(
        (name = "Knowledge Workspace API", description = "Document search and workspace assistant endpoints.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Request and Response Structs
//=========================================================================================

/// A document search: case-insensitive name match plus optional equality filters.
#[derive(Deserialize, Serialize, ToSchema, Debug, Clone, Default)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: String,
    #[serde(flatten)]
    pub filters: FiltersDto,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct SearchResponse {
    pub documents: Vec<DocumentDto>,
}

#[derive(Deserialize, Serialize, ToSchema, Debug, Clone)]
pub struct AskRequest {
    pub query: String,
}

fn not_found(what: &str, id: &str) -> ApiError {
    PortError::NotFound(format!("{} '{}'", what, id)).into()
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// List every document in the workspace.
#[utoipa::path(
    get,
    path = "/documents",
    responses((status = 200, description = "All documents in store order", body = [DocumentDto]))
)]
pub async fn list_documents_handler(
    State(app_state): State<Arc<AppState>>,
) -> Json<Vec<DocumentDto>> {
    Json(documents_to_dto(app_state.engine.store().documents()))
}

/// Fetch a single document for the reader.
#[utoipa::path(
    get,
    path = "/documents/{id}",
    params(("id" = String, Path, description = "The document id.")),
    responses(
        (status = 200, description = "The document", body = DocumentDto),
        (status = 404, description = "No document with that id")
    )
)]
pub async fn get_document_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DocumentDto>, ApiError> {
    app_state
        .engine
        .store()
        .document_by_id(&id)
        .map(|doc| Json(DocumentDto::from(doc)))
        .ok_or_else(|| not_found("Document", &id))
}

/// List the workspace collections.
#[utoipa::path(
    get,
    path = "/collections",
    responses((status = 200, description = "All collections", body = [CollectionDto]))
)]
pub async fn list_collections_handler(
    State(app_state): State<Arc<AppState>>,
) -> Json<Vec<CollectionDto>> {
    let store = app_state.engine.store();
    Json(store.collections().iter().map(CollectionDto::from).collect())
}

/// Open a collection.
///
/// Unknown ids open the first collection.
#[utoipa::path(
    get,
    path = "/collections/{id}",
    params(("id" = String, Path, description = "The collection id.")),
    responses(
        (status = 200, description = "The collection, or the first one for an unknown id", body = CollectionDto),
        (status = 404, description = "The workspace has no collections")
    )
)]
pub async fn get_collection_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CollectionDto>, ApiError> {
    app_state
        .engine
        .resolve_collection(&id)
        .map(|collection| Json(CollectionDto::from(collection)))
        .ok_or_else(|| not_found("Collection", &id))
}

/// List the workspace collaborators.
#[utoipa::path(
    get,
    path = "/members",
    responses((status = 200, description = "All members", body = [MemberDto]))
)]
pub async fn list_members_handler(State(app_state): State<Arc<AppState>>) -> Json<Vec<MemberDto>> {
    let store = app_state.engine.store();
    Json(store.members().iter().map(MemberDto::from).collect())
}

/// List the recent activity feed.
#[utoipa::path(
    get,
    path = "/activities",
    responses((status = 200, description = "Recent activity", body = [ActivityDto]))
)]
pub async fn list_activities_handler(
    State(app_state): State<Arc<AppState>>,
) -> Json<Vec<ActivityDto>> {
    let store = app_state.engine.store();
    Json(store.activities().iter().map(ActivityDto::from).collect())
}

/// Resolve the document an activity entry points at.
///
/// Activities whose target is not a known document resolve to the first document.
#[utoipa::path(
    get,
    path = "/activities/{id}/document",
    params(("id" = String, Path, description = "The activity id.")),
    responses(
        (status = 200, description = "The referenced document", body = DocumentDto),
        (status = 404, description = "Unknown activity or empty workspace")
    )
)]
pub async fn resolve_activity_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DocumentDto>, ApiError> {
    app_state
        .engine
        .resolve_activity(&id)
        .map(|doc| Json(DocumentDto::from(doc)))
        .ok_or_else(|| not_found("Activity", &id))
}

/// The selectable search filter values.
#[utoipa::path(
    get,
    path = "/search/facets",
    responses((status = 200, description = "Filter options, each prefixed with \"All\"", body = FacetsDto))
)]
pub async fn facets_handler(State(app_state): State<Arc<AppState>>) -> Json<FacetsDto> {
    Json(app_state.engine.facets().into())
}

/// Search documents by name with optional type and owner filters.
#[utoipa::path(
    post,
    path = "/search",
    request_body = SearchRequest,
    responses((status = 200, description = "Matching documents in store order", body = SearchResponse))
)]
pub async fn search_handler(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<SearchRequest>,
) -> Json<SearchResponse> {
    let filters = request.filters.into();
    let documents = app_state.engine.search(&request.query, &filters).await;
    Json(SearchResponse {
        documents: documents_to_dto(&documents),
    })
}

/// Ask the workspace assistant a question.
#[utoipa::path(
    post,
    path = "/ask",
    request_body = AskRequest,
    responses(
        (status = 200, description = "A synthesized answer with sources", body = AnswerDto),
        (status = 400, description = "Empty query"),
        (status = 503, description = "The answer synthesizer is unavailable")
    )
)]
pub async fn ask_handler(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AnswerDto>, ApiError> {
    match app_state.engine.ask(&request.query, None).await {
        Ok(answer) => {
            info!("Answered REST ask with {} sources.", answer.sources.len());
            Ok(Json(answer.into()))
        }
        Err(e) => {
            error!("Failed to answer question: {}", e);
            Err(e.into())
        }
    }
}
