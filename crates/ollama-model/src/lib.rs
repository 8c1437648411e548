//! A model provider for Ollama-compatible APIs.

#[macro_use]
extern crate tracing;

mod config;
mod proto;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

use mime::Mime;
use recall_agent_model::{
    ChatRequest, ChatResponse, Embedding, EmbeddingRequest, ErrorKind,
    ModelInfo, ModelProvider, ModelProviderError,
};
use reqwest::{Client, RequestBuilder, StatusCode, header};
use serde::de::DeserializeOwned;

pub use config::{OllamaConfig, OllamaConfigBuilder};
use proto::{ChatCompletion, EmbeddingResponse, TagsResponse};

/// Error type for [`OllamaProvider`].
#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Error {
    fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// Ollama-compatible model provider.
#[derive(Clone, Debug)]
pub struct OllamaProvider {
    client: Client,
    config: Arc<OllamaConfig>,
}

impl OllamaProvider {
    /// Creates a new `OllamaProvider` with the given configuration.
    #[inline]
    pub fn new(config: OllamaConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }

    fn prepare(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder.header(header::ACCEPT, "application/json");
        match self.config.timeout {
            Some(timeout) => builder.timeout(timeout),
            None => builder,
        }
    }
}

impl ModelProvider for OllamaProvider {
    type Error = Error;

    fn list_models(
        &self,
    ) -> impl Future<Output = Result<Vec<ModelInfo>, Self::Error>> + Send + 'static
    {
        let builder = self
            .prepare(self.client.get(self.config.endpoint("/api/tags")));
        async move {
            let tags: TagsResponse = send_json(builder).await?;
            Ok(proto::models_from_tags(tags))
        }
    }

    fn generate_response(
        &self,
        req: &ChatRequest,
    ) -> impl Future<Output = Result<ChatResponse, Self::Error>> + Send + 'static
    {
        let builder = self
            .prepare(self.client.post(self.config.endpoint("/api/chat")))
            .json(&proto::create_chat_request(req));
        async move {
            let completion: ChatCompletion = send_json(builder).await?;
            Ok(ChatResponse {
                message: completion.message,
                done: completion.done,
            })
        }
    }

    fn generate_embedding(
        &self,
        req: &EmbeddingRequest,
    ) -> impl Future<Output = Result<Embedding, Self::Error>> + Send + 'static
    {
        let builder = self
            .prepare(self.client.post(self.config.endpoint("/api/embeddings")))
            .json(&proto::create_embeddings_request(req));
        async move {
            let resp: EmbeddingResponse = send_json(builder).await?;
            Ok(resp.embedding)
        }
    }
}

async fn send_json<T: DeserializeOwned>(
    builder: RequestBuilder,
) -> Result<T, Error> {
    let resp = builder
        .send()
        .await
        .map_err(|err| Error::new(format!("{err}"), ErrorKind::Other))?;

    let status = resp.status();
    if !status.is_success() {
        let kind = error_kind_for_status(status);
        let body = resp.text().await.unwrap_or_default();
        debug!("request failed with {status}: {body}");
        return Err(Error::new(format!("{status}: {body}"), kind));
    }

    let content_type = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let is_json = content_type
        .as_deref()
        .and_then(|v| v.parse().ok())
        .map(|m: Mime| m.subtype() == mime::JSON)
        .unwrap_or(false);
    if !is_json {
        return Err(Error::new(
            format!("Unexpected content type: {content_type:?}"),
            ErrorKind::InvalidResponse,
        ));
    }

    let body = resp
        .bytes()
        .await
        .map_err(|err| Error::new(format!("{err}"), ErrorKind::Other))?;
    trace!("got a response body of {} bytes", body.len());
    serde_json::from_slice(&body)
        .map_err(|err| Error::new(format!("{err}"), ErrorKind::InvalidResponse))
}

#[inline]
fn error_kind_for_status(status: StatusCode) -> ErrorKind {
    match status {
        StatusCode::NOT_FOUND => ErrorKind::ModelNotFound,
        StatusCode::TOO_MANY_REQUESTS => ErrorKind::RateLimitExceeded,
        _ => ErrorKind::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_for_status() {
        assert_eq!(
            error_kind_for_status(StatusCode::NOT_FOUND),
            ErrorKind::ModelNotFound
        );
        assert_eq!(
            error_kind_for_status(StatusCode::TOO_MANY_REQUESTS),
            ErrorKind::RateLimitExceeded
        );
        assert_eq!(
            error_kind_for_status(StatusCode::INTERNAL_SERVER_ERROR),
            ErrorKind::Other
        );
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let config = OllamaConfigBuilder::new()
            .with_base_url("http://127.0.0.1:9")
            .build();
        let provider = OllamaProvider::new(config);
        let err = provider.list_models().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Other);
        assert!(!err.message().is_empty());
    }
}
