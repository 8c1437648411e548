use std::error::Error;

use crate::error::ErrorKind;
use crate::request::{ChatRequest, EmbeddingRequest};
use crate::response::{ChatResponse, Embedding, ModelInfo};

/// The error type for a model provider.
pub trait ModelProviderError: Error + Send + Sync + 'static {
    /// Returns the kind of this error.
    fn kind(&self) -> ErrorKind;
}

/// A type that represents a model provider, which is an entry for listing
/// models, generating chat replies and computing embeddings.
///
/// Once the provider is created, it should behave like a stateless object.
/// It can still have internal state, but callers should not rely on it,
/// and the provider should be prepared for being dropped anytime.
///
/// Every returned future must be fully independent of `self`.
pub trait ModelProvider: Send + Sync {
    /// The error type that may be returned by the provider.
    type Error: ModelProviderError;

    /// Lists the models available on this provider.
    fn list_models(
        &self,
    ) -> impl Future<Output = Result<Vec<ModelInfo>, Self::Error>> + Send + 'static;

    /// Sends a chat request and waits for the complete reply.
    ///
    /// Replies are never streamed, the whole assistant message is returned
    /// at once.
    fn generate_response(
        &self,
        req: &ChatRequest,
    ) -> impl Future<Output = Result<ChatResponse, Self::Error>> + Send + 'static;

    /// Computes the embedding vector of the prompt text.
    fn generate_embedding(
        &self,
        req: &EmbeddingRequest,
    ) -> impl Future<Output = Result<Embedding, Self::Error>> + Send + 'static;
}
