use crate::config::Config;
use anyhow::Context;
use domain::conversation::{ConversationMessage, Role};
use domain::error::ProviderError;
use domain::models::EmbeddingVector;
use domain::providers::{CompletionProvider, EmbeddingProvider};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use shared::types::Result;
use std::sync::Arc;

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Serialize, Debug, PartialEq)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

impl<'a> From<&'a ConversationMessage> for WireMessage<'a> {
    fn from(msg: &'a ConversationMessage) -> Self {
        let role = match msg.role {
            Role::System => "system",
            Role::User => "user",
            Role::Agent => "assistant",
        };
        Self {
            role,
            content: &msg.content,
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for OpenAI-compatible `/embeddings` and `/chat/completions` endpoints.
#[derive(Clone)]
pub struct OpenAiClient {
    client: Arc<Client>,
    base_url: String,
    api_key: String,
    embedding_model: String,
    chat_model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.provider_timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client: Arc::new(client),
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            embedding_model: config.embedding_model.clone(),
            chat_model: config.chat_model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    async fn post<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> std::result::Result<R, ProviderError> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::warn!(%url, status = status.as_u16(), "provider call failed");
            return Err(ProviderError::from_status(status.as_u16(), text));
        }
        response.json::<R>().await.map_err(transport_error)
    }
}

impl EmbeddingProvider for OpenAiClient {
    async fn embed(
        &self,
        texts: &[String],
    ) -> std::result::Result<Vec<EmbeddingVector>, ProviderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let request = EmbeddingRequest {
            model: &self.embedding_model,
            input: texts,
        };
        let response: EmbeddingResponse = self.post("embeddings", &request).await?;
        order_embeddings(response.data, texts.len())
    }
}

impl CompletionProvider for OpenAiClient {
    async fn complete(
        &self,
        messages: &[ConversationMessage],
    ) -> std::result::Result<String, ProviderError> {
        let request = ChatRequest {
            model: &self.chat_model,
            messages: messages.iter().map(WireMessage::from).collect(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };
        let response: ChatResponse = self.post("chat/completions", &request).await?;
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::Decode("completion returned no choices".to_string()))?;
        Ok(choice.message.content.unwrap_or_default())
    }
}

fn order_embeddings(
    mut data: Vec<EmbeddingData>,
    expected: usize,
) -> std::result::Result<Vec<EmbeddingVector>, ProviderError> {
    if data.len() != expected {
        return Err(ProviderError::Decode(format!(
            "expected {expected} embeddings, got {}",
            data.len()
        )));
    }
    data.sort_by_key(|d| d.index);
    if data.iter().enumerate().any(|(i, d)| d.index != i) {
        return Err(ProviderError::Decode(
            "embedding indices are not a permutation of the inputs".to_string(),
        ));
    }
    Ok(data.into_iter().map(|d| d.embedding).collect())
}

fn transport_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout
    } else if e.is_decode() {
        ProviderError::Decode(e.to_string())
    } else {
        ProviderError::Transport(e.to_string())
    }
}
