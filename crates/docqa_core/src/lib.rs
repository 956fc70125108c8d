pub mod domain;
pub mod error;
pub mod extract;
pub mod format;
pub mod memory;
pub mod normalize;
pub mod ports;
pub mod prompt;
pub mod resolve;
pub mod workflow;

pub use domain::{
    Document, DocumentId, DocumentSummary, QaEntry, SessionContext, User, UserCredentials, UserId,
};
pub use error::{QaError, QaResult};
pub use extract::extract;
pub use format::{sanitize_filename, DocumentFormat};
pub use normalize::{normalize, PlainText};
pub use ports::{
    DatabaseService, DocumentStore, PortError, PortResult, QaHistoryStore,
    QuestionAnsweringService, SessionStore, UserStore,
};
pub use prompt::build_prompt;
pub use workflow::{AskOutcome, DocumentView, FALLBACK_ANSWER};
