use std::error::Error;
use std::fmt::{self, Display};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use backoff::ExponentialBackoffBuilder;
use recall_agent_model::{
    ChatRequest, ChatResponse, Embedding, EmbeddingRequest, ErrorKind,
    ModelInfo, ModelProvider, ModelProviderError,
};
use tracing::Instrument;

const INITIAL_RETRY_INTERVAL: Duration = Duration::from_millis(100);

type ProviderResult<T> = Result<T, Box<dyn ModelProviderError>>;
type BoxedFuture<T> = Pin<Box<dyn Future<Output = ProviderResult<T>> + Send>>;

/// The stage of the pipeline that failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PipelineErrorKind {
    /// Listing the models failed.
    ListModels,
    /// The chat request failed.
    Chat,
    /// Computing an embedding failed.
    Embedding,
}

impl Display for PipelineErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineErrorKind::ListModels => write!(f, "listing models"),
            PipelineErrorKind::Chat => write!(f, "chat request"),
            PipelineErrorKind::Embedding => write!(f, "embedding request"),
        }
    }
}

/// An unrecoverable failure while talking to the model provider.
#[derive(Debug)]
pub struct PipelineError {
    kind: PipelineErrorKind,
    source: Box<dyn ModelProviderError>,
}

impl PipelineError {
    /// Returns which request failed.
    #[inline]
    pub fn kind(&self) -> PipelineErrorKind {
        self.kind
    }

    /// Returns the kind of the provider error behind this failure.
    #[inline]
    pub fn provider_error_kind(&self) -> ErrorKind {
        self.source.kind()
    }
}

impl Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.kind, self.source)
    }
}

impl Error for PipelineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.source.as_ref())
    }
}

trait ProviderObject: Send + Sync {
    fn list_models(&self) -> BoxedFuture<Vec<ModelInfo>>;

    fn generate_response(&self, req: &ChatRequest) -> BoxedFuture<ChatResponse>;

    fn generate_embedding(&self, req: &EmbeddingRequest) -> BoxedFuture<Embedding>;
}

struct ProviderObjectImpl<P: ModelProvider>(P);

impl<P: ModelProvider + 'static> ProviderObject for ProviderObjectImpl<P> {
    #[inline]
    fn list_models(&self) -> BoxedFuture<Vec<ModelInfo>> {
        let fut = self.0.list_models();
        Box::pin(async move { fut.await.map_err(erase) })
    }

    #[inline]
    fn generate_response(&self, req: &ChatRequest) -> BoxedFuture<ChatResponse> {
        let fut = self.0.generate_response(req);
        Box::pin(async move { fut.await.map_err(erase) })
    }

    #[inline]
    fn generate_embedding(&self, req: &EmbeddingRequest) -> BoxedFuture<Embedding> {
        let fut = self.0.generate_embedding(req);
        Box::pin(async move { fut.await.map_err(erase) })
    }
}

#[inline]
fn erase<E: ModelProviderError>(err: E) -> Box<dyn ModelProviderError> {
    Box::new(err)
}

/// A wrapper around a model provider that provides a type-erased
/// interface for the other modules.
///
/// Requests that hit the provider's rate limit are retried with an
/// exponential backoff; any other failure is returned immediately.
#[derive(Clone)]
pub(crate) struct ModelClient {
    provider: Arc<dyn ProviderObject>,
    max_retry_elapsed: Duration,
}

impl ModelClient {
    #[inline]
    pub fn new<P: ModelProvider + 'static>(
        provider: P,
        max_retry_elapsed: Duration,
    ) -> Self {
        // We have to erase the type `P`, since `ModelClient` doesn't have a
        // generic parameter and we don't want it either.
        Self {
            provider: Arc::new(ProviderObjectImpl(provider)),
            max_retry_elapsed,
        }
    }

    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, PipelineError> {
        self.with_retry(PipelineErrorKind::ListModels, || {
            self.provider.list_models()
        })
        .instrument(trace_span!("list models"))
        .await
    }

    pub async fn chat(
        &self,
        req: ChatRequest,
    ) -> Result<ChatResponse, PipelineError> {
        trace!("got a request: {req:?}");
        let span = debug_span!("chat", model = %req.model);
        self.with_retry(PipelineErrorKind::Chat, || {
            self.provider.generate_response(&req)
        })
        .instrument(span)
        .await
    }

    pub async fn embed(
        &self,
        model: String,
        prompt: String,
    ) -> Result<Embedding, PipelineError> {
        let span = trace_span!("embed", model = %model);
        let req = EmbeddingRequest { model, prompt };
        self.with_retry(PipelineErrorKind::Embedding, || {
            self.provider.generate_embedding(&req)
        })
        .instrument(span)
        .await
    }

    async fn with_retry<T, F>(
        &self,
        kind: PipelineErrorKind,
        mut op: F,
    ) -> Result<T, PipelineError>
    where
        F: FnMut() -> BoxedFuture<T> + Send,
    {
        let backoff = ExponentialBackoffBuilder::new()
            .with_initial_interval(INITIAL_RETRY_INTERVAL)
            .with_max_elapsed_time(Some(self.max_retry_elapsed))
            .build();
        let result = backoff::future::retry(backoff, || {
            let fut = op();
            async move {
                fut.await.map_err(|err| {
                    if err.kind() == ErrorKind::RateLimitExceeded {
                        warn!("{kind} is rate limited, will retry: {err}");
                        backoff::Error::transient(err)
                    } else {
                        backoff::Error::permanent(err)
                    }
                })
            }
        })
        .await;
        result.map_err(|source| {
            debug!("{kind} failed: {source}");
            PipelineError { kind, source }
        })
    }
}
