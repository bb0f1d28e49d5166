use crate::conversation::ConversationMessage;
use crate::error::ProviderError;
use crate::models::EmbeddingVector;
use std::future::Future;

/// Maps texts to vectors. One vector per input, in input order.
pub trait EmbeddingProvider: Send + Sync {
    fn embed(
        &self,
        texts: &[String],
    ) -> impl Future<Output = Result<Vec<EmbeddingVector>, ProviderError>> + Send;
}

/// Maps an ordered message sequence to the top completion's text.
pub trait CompletionProvider: Send + Sync {
    fn complete(
        &self,
        messages: &[ConversationMessage],
    ) -> impl Future<Output = Result<String, ProviderError>> + Send;
}
