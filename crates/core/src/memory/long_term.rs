use std::sync::{Arc, PoisonError, RwLock};

use recall_agent_model::Embedding;
use serde::{Deserialize, Serialize};

use super::similarity::cosine_similarity;
use crate::message::Message;

/// The minimum similarity for a memory to be recalled by default.
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.8;

/// A message indexed by the embedding of its content.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LongTermEntry {
    /// The embedding of the message content.
    pub embedding: Embedding,
    /// The message itself.
    pub message: Message,
}

/// A long-term entry with its similarity to a query.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoredEntry {
    /// Cosine similarity to the query.
    pub similarity: f32,
    /// The matched entry.
    pub entry: LongTermEntry,
}

/// The unbounded store of past messages.
///
/// This is a shared handle, clones see the same entries. Each message and
/// its embedding live in one record, and records are only ever appended
/// through [`LongTermMemory::commit`].
#[derive(Clone, Debug, Default)]
pub struct LongTermMemory {
    entries: Arc<RwLock<Vec<LongTermEntry>>>,
}

impl LongTermMemory {
    /// Creates an empty store.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Embeds the message content and appends the record.
    ///
    /// Nothing is appended when `embed` fails.
    pub async fn commit<E, F, Err>(
        &self,
        message: Message,
        embed: E,
    ) -> Result<(), Err>
    where
        E: FnOnce(String) -> F,
        F: Future<Output = Result<Embedding, Err>>,
    {
        let embedding = embed(message.content().to_owned()).await?;
        let mut entries =
            self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.push(LongTermEntry { embedding, message });
        trace!("long-term memory holds {} entries", entries.len());
        Ok(())
    }

    /// Copies the entries out, in commit order.
    #[inline]
    pub fn entries(&self) -> Vec<LongTermEntry> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if nothing has been committed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Scores every entry of `corpus` against the query embedding, keeps those
/// at or above `threshold` and sorts them by similarity, most similar
/// first. Equal scores keep their corpus order.
pub fn rank(
    query: &[f32],
    corpus: &[LongTermEntry],
    threshold: f32,
) -> Vec<ScoredEntry> {
    let mut scored: Vec<ScoredEntry> = corpus
        .iter()
        .map(|entry| ScoredEntry {
            similarity: cosine_similarity(query, &entry.embedding),
            entry: entry.clone(),
        })
        .filter(|scored| scored.similarity >= threshold)
        .collect();
    // `sort_by` is stable.
    scored.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
    scored
}

/// Embeds the query and ranks `corpus` against it, see [`rank`].
pub async fn search<E, F, Err>(
    query: &str,
    embed: E,
    corpus: &[LongTermEntry],
    threshold: f32,
) -> Result<Vec<ScoredEntry>, Err>
where
    E: FnOnce(String) -> F,
    F: Future<Output = Result<Embedding, Err>>,
{
    let query = embed(query.to_owned()).await?;
    Ok(rank(&query, corpus, threshold))
}
