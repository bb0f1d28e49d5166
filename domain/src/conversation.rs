use crate::models::CorpusEntry;
use serde::{Deserialize, Serialize};

/// Most recent history messages carried into the prompt.
pub const HISTORY_WINDOW: usize = 6;

const REFERENCE_HEADER: &str = "Use this reference if relevant:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    #[serde(alias = "assistant")]
    Agent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: Role,
    pub content: String,
}

impl ConversationMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn agent(content: impl Into<String>) -> Self {
        Self::new(Role::Agent, content)
    }
}

/// Render the retrieved entry for the knowledge slot. No entry renders empty.
pub fn knowledge_snippet(entry: Option<&CorpusEntry>) -> String {
    match entry {
        Some(entry) => format!(
            "{}\nQ: {}\nA: {}",
            REFERENCE_HEADER, entry.question, entry.answer
        ),
        None => String::new(),
    }
}

/// Build the exact message sequence sent to the completion provider:
/// directive, the last [`HISTORY_WINDOW`] history turns, the knowledge slot
/// (always present, possibly empty), then the user message.
pub fn assemble(
    directive: &str,
    history: &[ConversationMessage],
    knowledge: Option<&CorpusEntry>,
    user_message: &str,
) -> Vec<ConversationMessage> {
    let recent = &history[history.len().saturating_sub(HISTORY_WINDOW)..];

    let mut messages = Vec::with_capacity(recent.len() + 3);
    messages.push(ConversationMessage::system(directive));
    messages.extend(recent.iter().cloned());
    messages.push(ConversationMessage::system(knowledge_snippet(knowledge)));
    messages.push(ConversationMessage::user(user_message));
    messages
}

/// Append the sign-off on its own paragraph unless the answer already ends with it.
pub fn apply_sign_off(answer: String, sign_off: Option<&str>) -> String {
    let Some(sign_off) = sign_off.filter(|s| !s.is_empty()) else {
        return answer;
    };
    if answer.trim_end().ends_with(sign_off.trim_end()) {
        return answer;
    }
    format!("{answer}\n\n{sign_off}")
}
