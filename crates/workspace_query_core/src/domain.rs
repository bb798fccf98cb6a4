//! crates/workspace_query_core/src/domain.rs
//!
//! Defines the pure, core data structures for the knowledge workspace.
//! These structs are independent of any transport or serialization format.

/// The sentinel filter value that matches every document.
pub const ALL: &str = "All";

/// A stored file reference. Created once from fixture data and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: String,
    pub name: String,
    /// Short format tag such as "PDF" or "SQL". Free-form.
    pub doc_type: String,
    pub owner: String,
    /// Presentation-only label ("2h ago", "Oct 12"), not a timestamp.
    pub last_updated: String,
    pub content_snippet: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberRole {
    Admin,
    Editor,
    Viewer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberStatus {
    Online,
    Offline,
    Invited,
}

/// A collaborator with access to the workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: MemberRole,
    pub status: MemberStatus,
    pub last_active: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Shared,
    Private,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    pub id: String,
    pub name: String,
    pub item_count: u32,
    pub visibility: Visibility,
    pub icon: String,
    pub category: Option<String>,
}

/// A single entry in the workspace activity feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activity {
    pub id: String,
    pub user_id: String,
    pub action: String,
    /// The title of the document the action was applied to.
    pub target: String,
    pub time: String,
    pub comment: Option<String>,
}

/// Equality predicates applied on top of the name match.
///
/// `None` and `Some("All")` both mean "no restriction".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilters {
    pub doc_type: Option<String>,
    pub owner: Option<String>,
}

impl SearchFilters {
    pub fn new(doc_type: Option<String>, owner: Option<String>) -> Self {
        Self { doc_type, owner }
    }

    /// True when at least one filter would restrict the result set.
    pub fn is_active(&self) -> bool {
        restricts(&self.doc_type) || restricts(&self.owner)
    }

    /// Returns the filters to the all-pass state.
    pub fn reset(&mut self) {
        self.doc_type = None;
        self.owner = None;
    }

    pub fn matches(&self, document: &Document) -> bool {
        field_matches(&self.doc_type, &document.doc_type)
            && field_matches(&self.owner, &document.owner)
    }
}

fn restricts(filter: &Option<String>) -> bool {
    matches!(filter.as_deref(), Some(value) if value != ALL)
}

fn field_matches(filter: &Option<String>, value: &str) -> bool {
    match filter.as_deref() {
        Some(expected) if expected != ALL => expected == value,
        _ => true,
    }
}

/// The selectable filter values, each list prefixed with [`ALL`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Facets {
    pub types: Vec<String>,
    pub owners: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    Search,
    Ask,
}

/// A single user submission. Transient: discarded once it has produced a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub text: String,
    pub mode: SearchMode,
    pub filters: SearchFilters,
}

impl Query {
    pub fn search(text: impl Into<String>, filters: SearchFilters) -> Self {
        Self {
            text: text.into(),
            mode: SearchMode::Search,
            filters,
        }
    }

    pub fn ask(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            mode: SearchMode::Ask,
            filters: SearchFilters::default(),
        }
    }
}

/// A citation attached to an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub title: String,
}

/// A synthesized answer with its cited sources and suggested next prompts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerResult {
    pub text: String,
    pub sources: Vec<Source>,
    pub follow_ups: Vec<String>,
}

/// What a resolved query produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    Documents(Vec<Document>),
    Answer(AnswerResult),
}
