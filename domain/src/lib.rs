pub mod conversation;
pub mod error;
pub mod lead;
pub mod models;
pub mod providers;

pub use conversation::{ConversationMessage, Role};
pub use error::{PersistenceError, ProviderError, ServiceError};
pub use models::{ChatRequest, ChatResponse, Corpus, CorpusEntry, EmbeddingVector, ErrorResponse};
