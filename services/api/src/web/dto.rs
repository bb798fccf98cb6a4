//! services/api/src/web/dto.rs
//!
//! Serializable views of the core domain types, shared by the REST API and the
//! WebSocket console protocol.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use workspace_query_core::{
    Activity, AnswerResult, Collection, Document, Facets, Member, MemberRole, MemberStatus,
    SearchFilters, Visibility,
};

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentDto {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub owner: String,
    pub last_updated: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_snippet: Option<String>,
}

impl From<&Document> for DocumentDto {
    fn from(doc: &Document) -> Self {
        Self {
            id: doc.id.clone(),
            name: doc.name.clone(),
            doc_type: doc.doc_type.clone(),
            owner: doc.owner.clone(),
            last_updated: doc.last_updated.clone(),
            content_snippet: doc.content_snippet.clone(),
        }
    }
}

#[derive(Serialize, ToSchema, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MemberDto {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_active: Option<String>,
}

impl From<&Member> for MemberDto {
    fn from(member: &Member) -> Self {
        let role = match member.role {
            MemberRole::Admin => "Admin",
            MemberRole::Editor => "Editor",
            MemberRole::Viewer => "Viewer",
        };
        let status = match member.status {
            MemberStatus::Online => "Online",
            MemberStatus::Offline => "Offline",
            MemberStatus::Invited => "Invited",
        };
        Self {
            id: member.id.clone(),
            name: member.name.clone(),
            email: member.email.clone(),
            role: role.to_string(),
            status: status.to_string(),
            last_active: member.last_active.clone(),
        }
    }
}

#[derive(Serialize, ToSchema, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CollectionDto {
    pub id: String,
    pub name: String,
    pub item_count: u32,
    pub visibility: String,
    pub icon: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl From<&Collection> for CollectionDto {
    fn from(collection: &Collection) -> Self {
        let visibility = match collection.visibility {
            Visibility::Public => "Public",
            Visibility::Shared => "Shared",
            Visibility::Private => "Private",
        };
        Self {
            id: collection.id.clone(),
            name: collection.name.clone(),
            item_count: collection.item_count,
            visibility: visibility.to_string(),
            icon: collection.icon.clone(),
            category: collection.category.clone(),
        }
    }
}

#[derive(Serialize, ToSchema, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActivityDto {
    pub id: String,
    pub user_id: String,
    pub action: String,
    pub target: String,
    pub time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl From<&Activity> for ActivityDto {
    fn from(activity: &Activity) -> Self {
        Self {
            id: activity.id.clone(),
            user_id: activity.user_id.clone(),
            action: activity.action.clone(),
            target: activity.target.clone(),
            time: activity.time.clone(),
            comment: activity.comment.clone(),
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct SourceDto {
    pub title: String,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnswerDto {
    pub text: String,
    pub sources: Vec<SourceDto>,
    pub follow_ups: Vec<String>,
}

impl From<AnswerResult> for AnswerDto {
    fn from(answer: AnswerResult) -> Self {
        Self {
            text: answer.text,
            sources: answer
                .sources
                .into_iter()
                .map(|source| SourceDto {
                    title: source.title,
                })
                .collect(),
            follow_ups: answer.follow_ups,
        }
    }
}

#[derive(Serialize, ToSchema, Debug, Clone, PartialEq)]
pub struct FacetsDto {
    pub types: Vec<String>,
    pub owners: Vec<String>,
}

impl From<Facets> for FacetsDto {
    fn from(facets: Facets) -> Self {
        Self {
            types: facets.types,
            owners: facets.owners,
        }
    }
}

/// Equality filters as they arrive over the wire. `"All"` or absent means no restriction.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, Default, PartialEq)]
pub struct FiltersDto {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

impl From<FiltersDto> for SearchFilters {
    fn from(filters: FiltersDto) -> Self {
        SearchFilters::new(filters.doc_type, filters.owner)
    }
}

pub fn documents_to_dto(documents: &[Document]) -> Vec<DocumentDto> {
    documents.iter().map(DocumentDto::from).collect()
}
