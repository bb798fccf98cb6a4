//! crates/workspace_query_core/src/fixtures.rs
//!
//! The static, in-memory workspace the console runs against.

use crate::domain::{
    Activity, Collection, Document, Member, MemberRole, MemberStatus, Visibility,
};
use crate::ports::WorkspaceStore;

/// A [`WorkspaceStore`] backed by vectors built once at startup.
#[derive(Debug, Clone, Default)]
pub struct StaticWorkspace {
    documents: Vec<Document>,
    collections: Vec<Collection>,
    members: Vec<Member>,
    activities: Vec<Activity>,
}

impl StaticWorkspace {
    /// A workspace holding only the given documents.
    pub fn with_documents(documents: Vec<Document>) -> Self {
        Self {
            documents,
            ..Self::default()
        }
    }

    /// The demo workspace shipped with the console.
    pub fn demo() -> Self {
        Self {
            documents: demo_documents(),
            collections: demo_collections(),
            members: demo_members(),
            activities: demo_activities(),
        }
    }
}

impl WorkspaceStore for StaticWorkspace {
    fn documents(&self) -> &[Document] {
        &self.documents
    }

    fn collections(&self) -> &[Collection] {
        &self.collections
    }

    fn members(&self) -> &[Member] {
        &self.members
    }

    fn activities(&self) -> &[Activity] {
        &self.activities
    }
}

fn document(id: &str, name: &str, doc_type: &str, owner: &str, last_updated: &str) -> Document {
    Document {
        id: id.to_string(),
        name: name.to_string(),
        doc_type: doc_type.to_string(),
        owner: owner.to_string(),
        last_updated: last_updated.to_string(),
        content_snippet: None,
    }
}

fn demo_documents() -> Vec<Document> {
    vec![
        document("d1", "Product Roadmap 2024", "PDF", "Alex Rivera", "2h ago"),
        document("d2", "Branding Guidelines", "DOCX", "Sarah Chen", "Yesterday"),
        document("d3", "Engineering Onboarding", "PDF", "Alex Chen", "Oct 12"),
        document("d4", "Schema Definition", "SQL", "Marc V.", "Oct 10"),
    ]
}

fn member(
    id: &str,
    name: &str,
    email: &str,
    role: MemberRole,
    status: MemberStatus,
    last_active: Option<&str>,
) -> Member {
    Member {
        id: id.to_string(),
        name: name.to_string(),
        email: email.to_string(),
        role,
        status,
        last_active: last_active.map(str::to_string),
    }
}

fn demo_members() -> Vec<Member> {
    use MemberRole::*;
    use MemberStatus::*;
    vec![
        member("1", "Alex Rivera", "alex@team.com", Admin, Online, Some("Now")),
        member("2", "Jordan Smith", "jordan@team.com", Editor, Offline, Some("2h ago")),
        member("3", "Taylor Chen", "taylor@team.com", Viewer, Offline, Some("Yesterday")),
        member("4", "Morgan Lee", "morgan@team.com", Editor, Invited, None),
    ]
}

fn collection(id: &str, name: &str, item_count: u32, visibility: Visibility, icon: &str) -> Collection {
    Collection {
        id: id.to_string(),
        name: name.to_string(),
        item_count,
        visibility,
        icon: icon.to_string(),
        category: None,
    }
}

fn demo_collections() -> Vec<Collection> {
    vec![
        collection("c1", "Product Wiki", 24, Visibility::Public, "folder"),
        collection("c2", "Marketing Assets", 112, Visibility::Shared, "auto_fix_high"),
        collection("c3", "Research Library", 85, Visibility::Private, "menu_book"),
    ]
}

fn demo_activities() -> Vec<Activity> {
    vec![
        Activity {
            id: "a1".to_string(),
            user_id: "u1".to_string(),
            action: "uploaded".to_string(),
            target: "Brand Styleguide v2.1".to_string(),
            time: "Today, 10:45 AM".to_string(),
            comment: None,
        },
        Activity {
            id: "a2".to_string(),
            user_id: "u2".to_string(),
            action: "updated".to_string(),
            target: "Marketing Budget Q4".to_string(),
            time: "Yesterday, 3:20 PM".to_string(),
            comment: Some("Adjusted the social media spend for November.".to_string()),
        },
        Activity {
            id: "a3".to_string(),
            user_id: "u1".to_string(),
            action: "created".to_string(),
            target: "Brand Identity Refresh 2024".to_string(),
            time: "Oct 14, 2023".to_string(),
            comment: None,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_workspace_has_unique_document_ids() {
        let workspace = StaticWorkspace::demo();
        let mut ids: Vec<&str> = workspace.documents().iter().map(|d| d.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), workspace.documents().len());
    }

    #[test]
    fn document_lookup_by_id() {
        let workspace = StaticWorkspace::demo();
        assert_eq!(
            workspace.document_by_id("d4").map(|d| d.name.as_str()),
            Some("Schema Definition")
        );
        assert!(workspace.document_by_id("missing").is_none());
    }

    #[test]
    fn collection_lookup_by_id() {
        let workspace = StaticWorkspace::demo();
        assert_eq!(
            workspace.collection_by_id("c2").map(|c| c.item_count),
            Some(112)
        );
        assert!(workspace.collection_by_id("c9").is_none());
    }
}
