//! Scripted provider fakes shared by the integration tests.

use domain::conversation::ConversationMessage;
use domain::error::ProviderError;
use domain::models::{Corpus, CorpusEntry, EmbeddingVector};
use domain::providers::{CompletionProvider, EmbeddingProvider};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Vocabulary for the keyword embedder: one dimension per term.
pub const VOCABULARY: [&str; 4] = ["riddor", "fire", "first aid", "asbestos"];

pub fn keyword_vector(text: &str) -> EmbeddingVector {
    let lower = text.to_lowercase();
    VOCABULARY
        .iter()
        .map(|term| if lower.contains(term) { 1.0 } else { 0.0 })
        .collect()
}

pub fn riddor_corpus() -> Corpus {
    Corpus::new(
        "You are the SafeWork UK assistant.",
        vec![CorpusEntry::new("What is RIDDOR?", "A UK reporting regime...")],
        Some("— SafeWork UK".to_string()),
    )
}

pub fn safety_corpus() -> Corpus {
    Corpus::new(
        "You are the SafeWork UK assistant.",
        vec![
            CorpusEntry::new("Do I need a fire risk assessment?", "Yes, for any non-domestic premises."),
            CorpusEntry::new("What is RIDDOR?", "A UK reporting regime..."),
            CorpusEntry::new("How many first aid kits?", "At least one per site, sized to headcount."),
        ],
        Some("— SafeWork UK".to_string()),
    )
}

/// Embeds by keyword presence and records every batch it receives.
#[derive(Default)]
pub struct KeywordEmbedder {
    calls: AtomicUsize,
    batches: Mutex<Vec<Vec<String>>>,
    failing: AtomicBool,
    delay: Option<Duration>,
}

impl KeywordEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn batches(&self) -> Vec<Vec<String>> {
        self.batches.lock().unwrap().clone()
    }
}

impl EmbeddingProvider for KeywordEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<EmbeddingVector>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.batches.lock().unwrap().push(texts.to_vec());
        if self.failing.load(Ordering::SeqCst) {
            return Err(ProviderError::Unavailable {
                status: 503,
                body: "embedding backend down".to_string(),
            });
        }
        Ok(texts.iter().map(|t| keyword_vector(t)).collect())
    }
}

/// Returns a fixed reply and keeps the last message sequence it was given.
pub struct RecordingCompleter {
    reply: Result<String, ProviderError>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    last: Mutex<Option<Vec<ConversationMessage>>>,
}

impl RecordingCompleter {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            delay: None,
            calls: AtomicUsize::new(0),
            last: Mutex::new(None),
        }
    }

    pub fn failing(err: ProviderError) -> Self {
        Self {
            reply: Err(err),
            ..Self::replying("")
        }
    }

    pub fn slow(reply: &str, delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::replying(reply)
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_messages(&self) -> Option<Vec<ConversationMessage>> {
        self.last.lock().unwrap().clone()
    }
}

impl CompletionProvider for RecordingCompleter {
    async fn complete(&self, messages: &[ConversationMessage]) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some(messages.to_vec());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.reply.clone()
    }
}
