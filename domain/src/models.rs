use crate::conversation::ConversationMessage;
use crate::error::ServiceError;
use serde::{Deserialize, Serialize};

pub type EmbeddingVector = Vec<f32>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusEntry {
    pub question: String,
    pub answer: String,
}

impl CorpusEntry {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }

    /// Text sent to the embedding provider for this entry.
    pub fn embedding_text(&self) -> String {
        format!("{}\n{}", self.question, self.answer)
    }
}

/// The knowledge corpus plus the directive and sign-off that travel with it.
/// Entries are addressed by position; the embedding cache shares that indexing.
#[derive(Debug, Clone)]
pub struct Corpus {
    directive: String,
    entries: Vec<CorpusEntry>,
    sign_off: Option<String>,
}

impl Corpus {
    pub fn new(
        directive: impl Into<String>,
        entries: Vec<CorpusEntry>,
        sign_off: Option<String>,
    ) -> Self {
        Self {
            directive: directive.into(),
            entries,
            sign_off: sign_off.filter(|s| !s.trim().is_empty()),
        }
    }

    pub fn directive(&self) -> &str {
        &self.directive
    }

    pub fn get(&self, index: usize) -> Option<&CorpusEntry> {
        self.entries.get(index)
    }

    pub fn sign_off(&self) -> Option<&str> {
        self.sign_off.as_deref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn embedding_texts(&self) -> Vec<String> {
        self.entries.iter().map(CorpusEntry::embedding_text).collect()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<ConversationMessage>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            history: Vec::new(),
        }
    }

    pub fn with_history(mut self, history: Vec<ConversationMessage>) -> Self {
        self.history = history;
        self
    }

    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.message.trim().is_empty() {
            return Err(ServiceError::validation("Missing message"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl From<&ServiceError> for ErrorResponse {
    fn from(err: &ServiceError) -> Self {
        Self {
            error: err.to_string(),
        }
    }
}
