use crate::embedding_cache::EmbeddingCacheManager;
use domain::conversation::{apply_sign_off, assemble};
use domain::error::{ProviderError, ServiceError};
use domain::models::{ChatRequest, ChatResponse, Corpus, CorpusEntry, EmbeddingVector};
use domain::providers::{CompletionProvider, EmbeddingProvider};
use infrastructure::search::SearchEngine;
use shared::telemetry::Telemetry;
use std::sync::Arc;
use std::time::Duration;

/// Answers one chat request: validate, refresh cache, embed, rank, assemble, complete.
pub struct RagService<E, C> {
    corpus: Arc<Corpus>,
    cache: Arc<EmbeddingCacheManager<E>>,
    completer: Arc<C>,
}

impl<E: EmbeddingProvider, C: CompletionProvider> RagService<E, C> {
    pub fn new(
        corpus: Arc<Corpus>,
        cache: Arc<EmbeddingCacheManager<E>>,
        completer: Arc<C>,
    ) -> Self {
        Self {
            corpus,
            cache,
            completer,
        }
    }

    pub fn cache(&self) -> &Arc<EmbeddingCacheManager<E>> {
        &self.cache
    }

    pub async fn answer(&self, request: &ChatRequest) -> Result<ChatResponse, ServiceError> {
        request.validate()?;
        let telemetry = Telemetry::start("chat");

        let knowledge = self.retrieve(&request.message).await?;
        let messages = assemble(
            self.corpus.directive(),
            &request.history,
            knowledge,
            &request.message,
        );
        tracing::debug!(
            messages = messages.len(),
            grounded = knowledge.is_some(),
            "assembled prompt"
        );

        let reply = self.completer.complete(&messages).await?;
        let answer = apply_sign_off(reply, self.corpus.sign_off());

        telemetry.finish();
        Ok(ChatResponse { answer })
    }

    /// Same as [`answer`](Self::answer), failing with a provider timeout once `deadline` passes.
    pub async fn answer_with_deadline(
        &self,
        request: &ChatRequest,
        deadline: Duration,
    ) -> Result<ChatResponse, ServiceError> {
        tokio::time::timeout(deadline, self.answer(request))
            .await
            .map_err(|_| ServiceError::Provider(ProviderError::Timeout))?
    }

    /// Best corpus entry for `message`, or `None` when the corpus is empty.
    pub async fn retrieve(&self, message: &str) -> Result<Option<&CorpusEntry>, ServiceError> {
        let vectors = self.cache.ensure_valid().await?;
        let query = self.embed_query(message).await?;
        let best = SearchEngine::top_k(&query, &vectors, 1).first().copied();
        Ok(best.and_then(|idx| self.corpus.get(idx)))
    }

    async fn embed_query(&self, message: &str) -> Result<EmbeddingVector, ServiceError> {
        let mut vectors = self
            .cache
            .provider()
            .embed(&[message.to_string()])
            .await?;
        if vectors.len() != 1 {
            return Err(ProviderError::Decode(format!(
                "expected 1 query embedding, got {}",
                vectors.len()
            ))
            .into());
        }
        Ok(vectors.swap_remove(0))
    }
}
