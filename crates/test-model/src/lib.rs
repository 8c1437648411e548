//! A local fake model for testing purpose.

mod preset;

use std::collections::{HashMap, HashSet, VecDeque};
use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use recall_agent_model::{
    ChatMessage, ChatRequest, ChatResponse, Embedding, EmbeddingRequest,
    ErrorKind, ModelInfo, ModelProvider, ModelProviderError,
};
use tokio::time::sleep;

pub use preset::*;

const DEFAULT_DIMENSION: usize = 3;

#[derive(Debug)]
pub struct Error {
    message: &'static str,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.kind)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

#[derive(Default)]
struct State {
    models: Vec<String>,
    script: VecDeque<PresetResponse>,
    embeddings: HashMap<String, Embedding>,
    failing_embeddings: HashSet<String>,
    dimension: Option<usize>,
    delay: Option<Duration>,
    chat_requests: Vec<ChatRequest>,
    embedding_requests: Vec<EmbeddingRequest>,
}

/// A local fake model for testing purpose.
///
/// Before sending requests, you need to setup the script, which is how the
/// model should respond. Chat replies are consumed in the order they were
/// added. If there are no enough replies in the script, an error will be
/// returned. Embeddings are looked up by the exact prompt text, unknown
/// prompts embed to a zero vector.
///
/// Clones share the same script and recordings, so a test can hand one
/// clone to the agent and inspect the other.
///
/// # Note
///
/// This type is not optimized for production use, there are heavy memory
/// copies involved. You should only use it for testing.
#[derive(Clone, Default)]
pub struct TestModelProvider {
    state: Arc<Mutex<State>>,
}

impl TestModelProvider {
    #[inline]
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[inline]
    pub fn add_model<S: Into<String>>(&self, name: S) {
        self.lock().models.push(name.into());
    }

    #[inline]
    pub fn add_response(&self, preset: PresetResponse) {
        self.lock().script.push_back(preset);
    }

    #[inline]
    pub fn add_embedding<S: Into<String>>(&self, text: S, embedding: Embedding) {
        self.lock().embeddings.insert(text.into(), embedding);
    }

    /// Makes every embedding request of `text` fail.
    #[inline]
    pub fn fail_embedding<S: Into<String>>(&self, text: S) {
        self.lock().failing_embeddings.insert(text.into());
    }

    /// Sets the length of the zero vector returned for unknown prompts.
    #[inline]
    pub fn set_dimension(&self, dimension: usize) {
        self.lock().dimension = Some(dimension);
    }

    #[inline]
    pub fn set_delay(&self, duration: Duration) {
        self.lock().delay = Some(duration);
    }

    /// Returns every chat request received so far.
    #[inline]
    pub fn chat_requests(&self) -> Vec<ChatRequest> {
        self.lock().chat_requests.clone()
    }

    /// Returns every embedding request received so far.
    #[inline]
    pub fn embedding_requests(&self) -> Vec<EmbeddingRequest> {
        self.lock().embedding_requests.clone()
    }

    fn next_response(&self, req: &ChatRequest) -> Result<ChatResponse, Error> {
        let mut state = self.lock();
        state.chat_requests.push(req.clone());

        let Some(preset) = state.script.front_mut() else {
            return Err(Error {
                message: "no enough responses",
                kind: ErrorKind::Other,
            });
        };
        match preset.failures {
            Some(0) => {
                return Err(Error {
                    message: "preset failure",
                    kind: ErrorKind::Other,
                });
            }
            Some(n) => {
                preset.failures = if n > 1 { Some(n - 1) } else { None };
                return Err(Error {
                    message: "preset rate limit",
                    kind: ErrorKind::RateLimitExceeded,
                });
            }
            None => {}
        }

        let preset = state.script.pop_front().ok_or(Error {
            message: "no enough responses",
            kind: ErrorKind::Other,
        })?;
        Ok(ChatResponse {
            message: ChatMessage::assistant(preset.content),
            done: true,
        })
    }

    fn embed(&self, req: &EmbeddingRequest) -> Result<Embedding, Error> {
        let mut state = self.lock();
        state.embedding_requests.push(req.clone());

        if state.failing_embeddings.contains(&req.prompt) {
            return Err(Error {
                message: "preset embedding failure",
                kind: ErrorKind::Other,
            });
        }
        let dimension = state.dimension.unwrap_or(DEFAULT_DIMENSION);
        Ok(state
            .embeddings
            .get(&req.prompt)
            .cloned()
            .unwrap_or_else(|| vec![0.0; dimension]))
    }

    #[inline]
    fn delay(&self) -> Duration {
        self.lock().delay.unwrap_or(Duration::from_millis(1))
    }
}

impl ModelProvider for TestModelProvider {
    type Error = crate::Error;

    fn list_models(
        &self,
    ) -> impl Future<Output = Result<Vec<ModelInfo>, Self::Error>> + Send + 'static
    {
        let models = self
            .lock()
            .models
            .iter()
            .map(|name| ModelInfo { name: name.clone() })
            .collect();
        async move { Ok(models) }
    }

    fn generate_response(
        &self,
        req: &ChatRequest,
    ) -> impl Future<Output = Result<ChatResponse, Self::Error>> + Send + 'static
    {
        let resp = self.next_response(req);
        let delay = self.delay();
        async move {
            sleep(delay).await;
            resp
        }
    }

    fn generate_embedding(
        &self,
        req: &EmbeddingRequest,
    ) -> impl Future<Output = Result<Embedding, Self::Error>> + Send + 'static
    {
        let resp = self.embed(req);
        async move { resp }
    }
}
