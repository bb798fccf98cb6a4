pub mod domain;
pub mod engine;
pub mod fixtures;
pub mod mock;
pub mod ports;
pub mod session;

pub use domain::{
    Activity, AnswerResult, Collection, Document, Facets, Member, MemberRole, MemberStatus, Query,
    QueryOutcome, SearchFilters, SearchMode, Source, Visibility,
};
pub use engine::{EngineTiming, QueryEngine, QueryError, QueryResult, StatusSender, STATUS_STEPS};
pub use fixtures::StaticWorkspace;
pub use mock::MockSynthesizer;
pub use ports::{AnswerSynthesizer, PortError, PortResult, WorkspaceStore};
pub use session::{QueryResponse, QuerySession, Submission};
