use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::future::ready;
use std::time::Duration;

use recall_agent_model::{
    ChatMessage, ChatRequest, ChatResponse, ChatRole, Embedding,
    EmbeddingRequest, ErrorKind, ModelInfo, ModelProvider, ModelProviderError,
};
use tokio::time::sleep;

#[derive(Debug)]
struct FakeModelProviderError(ErrorKind);

impl Display for FakeModelProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl Error for FakeModelProviderError {}

impl ModelProviderError for FakeModelProviderError {
    fn kind(&self) -> ErrorKind {
        self.0
    }
}

/// Echoes the last user message and embeds text by its length.
struct FakeModelProvider;

impl ModelProvider for FakeModelProvider {
    type Error = FakeModelProviderError;

    fn list_models(
        &self,
    ) -> impl Future<Output = Result<Vec<ModelInfo>, Self::Error>> + Send + 'static
    {
        ready(Ok(vec![ModelInfo {
            name: "fake:latest".to_owned(),
        }]))
    }

    fn generate_response(
        &self,
        req: &ChatRequest,
    ) -> impl Future<Output = Result<ChatResponse, Self::Error>> + Send + 'static
    {
        let last_user = req
            .messages
            .iter()
            .rev()
            .find(|msg| msg.role == ChatRole::User)
            .map(|msg| msg.content.clone());
        let model = req.model.clone();
        async move {
            sleep(Duration::from_millis(1)).await;
            if model != "fake:latest" {
                return Err(FakeModelProviderError(ErrorKind::ModelNotFound));
            }
            let Some(input) = last_user else {
                return Err(FakeModelProviderError(ErrorKind::Other));
            };
            Ok(ChatResponse {
                message: ChatMessage::assistant(format!("You said {input}")),
                done: true,
            })
        }
    }

    fn generate_embedding(
        &self,
        req: &EmbeddingRequest,
    ) -> impl Future<Output = Result<Embedding, Self::Error>> + Send + 'static
    {
        let len = req.prompt.len() as f32;
        ready(Ok(vec![len, 1.0]))
    }
}

#[tokio::test]
async fn test_fake_model() {
    let provider = FakeModelProvider;

    let models = provider.list_models().await.unwrap();
    assert_eq!(models.len(), 1);

    let req = ChatRequest {
        model: models[0].name.clone(),
        messages: vec![
            ChatMessage::system("Be brief."),
            ChatMessage::user("Hello there"),
        ],
    };
    let resp = provider.generate_response(&req).await.unwrap();
    assert!(resp.done);
    assert_eq!(resp.message.role, ChatRole::Assistant);
    assert_eq!(resp.message.content, "You said Hello there");

    let embedding = provider
        .generate_embedding(&EmbeddingRequest {
            model: "fake:latest".to_owned(),
            prompt: "four".to_owned(),
        })
        .await
        .unwrap();
    assert_eq!(embedding, vec![4.0, 1.0]);
}

#[tokio::test]
async fn test_unknown_model() {
    let provider = FakeModelProvider;
    let req = ChatRequest {
        model: "missing".to_owned(),
        messages: vec![ChatMessage::user("Hi")],
    };
    let err = provider.generate_response(&req).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ModelNotFound);
}

#[test]
fn test_chat_message_wire_format() {
    let msg = ChatMessage::user("Hi");
    let value = serde_json::to_value(&msg).unwrap();
    assert_eq!(value, serde_json::json!({ "role": "user", "content": "Hi" }));
}
