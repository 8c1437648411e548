use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use crate::memory::{DEFAULT_SHORT_TERM_CAPACITY, DEFAULT_SIMILARITY_THRESHOLD};

const DEFAULT_MAX_RETRY_ELAPSED: Duration = Duration::from_secs(10);

/// Builder for [`AgentConfig`].
#[derive(Clone, Debug, Default)]
pub struct AgentConfigBuilder {
    model: Option<String>,
    embedding_model: Option<String>,
    short_term_capacity: Option<usize>,
    similarity_threshold: Option<f32>,
    max_retry_elapsed: Option<Duration>,
}

impl AgentConfigBuilder {
    /// Creates a builder with default settings.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects the chat model up front.
    #[inline]
    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Uses a dedicated model for embeddings instead of the chat model.
    #[inline]
    pub fn with_embedding_model<S: Into<String>>(mut self, model: S) -> Self {
        self.embedding_model = Some(model.into());
        self
    }

    /// Sets how many recent messages are kept in the short-term memory.
    #[inline]
    pub fn with_short_term_capacity(mut self, capacity: usize) -> Self {
        self.short_term_capacity = Some(capacity);
        self
    }

    /// Sets the minimum similarity for a long-term memory to be recalled.
    #[inline]
    pub fn with_similarity_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = Some(threshold);
        self
    }

    /// Sets how long rate-limited requests are retried. `Duration::ZERO`
    /// disables retrying.
    #[inline]
    pub fn with_max_retry_elapsed(mut self, elapsed: Duration) -> Self {
        self.max_retry_elapsed = Some(elapsed);
        self
    }

    /// Builds the configuration.
    #[inline]
    pub fn build(self) -> AgentConfig {
        AgentConfig {
            model: self.model,
            embedding_model: self.embedding_model,
            short_term_capacity: self
                .short_term_capacity
                .unwrap_or(DEFAULT_SHORT_TERM_CAPACITY)
                .max(1),
            similarity_threshold: self
                .similarity_threshold
                .unwrap_or(DEFAULT_SIMILARITY_THRESHOLD),
            max_retry_elapsed: self
                .max_retry_elapsed
                .unwrap_or(DEFAULT_MAX_RETRY_ELAPSED),
        }
    }
}

/// Configuration for the agent.
#[derive(Clone, Debug, PartialEq)]
pub struct AgentConfig {
    pub(crate) model: Option<String>,
    pub(crate) embedding_model: Option<String>,
    pub(crate) short_term_capacity: usize,
    pub(crate) similarity_threshold: f32,
    pub(crate) max_retry_elapsed: Duration,
}

impl Default for AgentConfig {
    #[inline]
    fn default() -> Self {
        AgentConfigBuilder::new().build()
    }
}

#[derive(Debug, Default)]
struct Selected {
    chat: Option<String>,
    embedding: Option<String>,
}

/// The models in use, shared between the orchestrator and memory search
/// handles so a runtime selection is seen by both.
#[derive(Clone, Debug, Default)]
pub(crate) struct ModelSelection(Arc<RwLock<Selected>>);

impl ModelSelection {
    pub fn new(chat: Option<String>, embedding: Option<String>) -> Self {
        Self(Arc::new(RwLock::new(Selected { chat, embedding })))
    }

    #[inline]
    pub fn select(&self, model: String) {
        let mut selected =
            self.0.write().unwrap_or_else(PoisonError::into_inner);
        selected.chat = Some(model);
    }

    #[inline]
    pub fn chat_model(&self) -> Option<String> {
        let selected = self.0.read().unwrap_or_else(PoisonError::into_inner);
        selected.chat.clone()
    }

    /// Falls back to the chat model when no embedding model is set.
    #[inline]
    pub fn embedding_model(&self) -> Option<String> {
        let selected = self.0.read().unwrap_or_else(PoisonError::into_inner);
        selected.embedding.clone().or_else(|| selected.chat.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AgentConfig::default();
        assert_eq!(config.model, None);
        assert_eq!(config.short_term_capacity, 10);
        assert_eq!(config.similarity_threshold, 0.8);
        assert_eq!(config.max_retry_elapsed, Duration::from_secs(10));
    }

    #[test]
    fn test_embedding_model_follows_selection() {
        let selection = ModelSelection::new(None, None);
        assert_eq!(selection.embedding_model(), None);

        let shared = selection.clone();
        shared.select("llama3.2".to_owned());
        assert_eq!(selection.chat_model().as_deref(), Some("llama3.2"));
        assert_eq!(selection.embedding_model().as_deref(), Some("llama3.2"));

        let selection = ModelSelection::new(
            Some("llama3.2".to_owned()),
            Some("nomic-embed-text".to_owned()),
        );
        assert_eq!(
            selection.embedding_model().as_deref(),
            Some("nomic-embed-text")
        );
    }
}
