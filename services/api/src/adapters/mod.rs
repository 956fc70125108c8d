pub mod db;
pub mod qa_llm;
pub mod resilient;

pub use db::DbAdapter;
pub use qa_llm::OpenAiQaAdapter;
pub use resilient::{ResilientQaService, RetryPolicy};
