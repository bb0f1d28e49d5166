use anyhow::Context;
use domain::models::{Corpus, CorpusEntry};
use serde::Deserialize;
use shared::types::Result;
use std::path::Path;

#[derive(Deserialize)]
struct AgentDocument {
    core_prompt: String,
    faqs: Vec<CorpusEntry>,
    #[serde(default)]
    branding: Option<Branding>,
}

#[derive(Deserialize)]
struct Branding {
    #[serde(default)]
    sign_off: Option<String>,
}

/// Reads the agent document once at startup. Any failure here is fatal.
pub struct CorpusLoader;

impl CorpusLoader {
    pub fn load(path: impl AsRef<Path>) -> Result<Corpus> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read agent config at {:?}", path))?;
        let corpus = Self::parse(&raw)
            .with_context(|| format!("Malformed agent config at {:?}", path))?;
        tracing::info!(
            entries = corpus.len(),
            signed = corpus.sign_off().is_some(),
            "loaded knowledge corpus from {:?}",
            path
        );
        Ok(corpus)
    }

    pub fn parse(raw: &str) -> Result<Corpus> {
        let doc: AgentDocument = serde_json::from_str(raw)?;
        let sign_off = doc.branding.and_then(|b| b.sign_off);
        Ok(Corpus::new(doc.core_prompt, doc.faqs, sign_off))
    }
}
