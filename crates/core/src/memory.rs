//! Short-term and long-term conversation memory.

mod long_term;
mod short_term;
mod similarity;

pub use long_term::{
    DEFAULT_SIMILARITY_THRESHOLD, LongTermEntry, LongTermMemory, ScoredEntry,
    rank, search,
};
pub use short_term::{DEFAULT_SHORT_TERM_CAPACITY, ShortTermMemory, prune};
pub use similarity::cosine_similarity;

use crate::config::ModelSelection;
use crate::message::Message;
use crate::model_client::{ModelClient, PipelineError};

/// A handle for searching the long-term memory of an agent.
///
/// It can be cloned and moved into tools, searches always see the entries
/// committed so far and the currently selected embedding model.
#[derive(Clone)]
pub struct MemorySearch {
    memory: LongTermMemory,
    client: ModelClient,
    selection: ModelSelection,
    threshold: f32,
}

impl MemorySearch {
    #[inline]
    pub(crate) fn new(
        memory: LongTermMemory,
        client: ModelClient,
        selection: ModelSelection,
        threshold: f32,
    ) -> Self {
        Self {
            memory,
            client,
            selection,
            threshold,
        }
    }

    /// Returns the messages relevant to `query`, most similar first.
    ///
    /// Without a selected model nothing can be embedded, and the result is
    /// empty.
    pub async fn search(&self, query: &str) -> Result<Vec<Message>, PipelineError> {
        let Some(model) = self.selection.embedding_model() else {
            return Ok(Vec::new());
        };
        let corpus = self.memory.entries();
        let scored = search(
            query,
            |text| self.client.embed(model, text),
            &corpus,
            self.threshold,
        )
        .await?;
        debug!("recalled {} of {} memories", scored.len(), corpus.len());
        Ok(scored.into_iter().map(|s| s.entry.message).collect())
    }

    /// Returns the underlying long-term memory.
    #[inline]
    pub fn memory(&self) -> &LongTermMemory {
        &self.memory
    }
}
