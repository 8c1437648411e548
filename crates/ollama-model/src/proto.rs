use recall_agent_model::{
    ChatMessage, ChatRequest, Embedding, EmbeddingRequest, ModelInfo,
};
use serde::{Deserialize, Serialize};

// ------------------------------
// Types received from the server
// ------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct TagsResponse {
    pub models: Vec<Tag>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Tag {
    pub name: String,
    #[allow(dead_code)]
    pub modified_at: Option<String>,
    #[allow(dead_code)]
    pub size: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ChatCompletion {
    pub message: ChatMessage,
    #[serde(default)]
    pub done: bool,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct EmbeddingResponse {
    pub embedding: Embedding,
}

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EmbeddingsRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

// -----------
// Conversions
// -----------

#[inline]
pub fn create_chat_request(req: &ChatRequest) -> ChatCompletionRequest<'_> {
    ChatCompletionRequest {
        model: &req.model,
        messages: &req.messages,
        stream: false,
    }
}

#[inline]
pub fn create_embeddings_request(
    req: &EmbeddingRequest,
) -> EmbeddingsRequest<'_> {
    EmbeddingsRequest {
        model: &req.model,
        prompt: &req.prompt,
    }
}

#[inline]
pub fn models_from_tags(tags: TagsResponse) -> Vec<ModelInfo> {
    tags.models
        .into_iter()
        .map(|tag| ModelInfo { name: tag.name })
        .collect()
}

#[cfg(test)]
mod tests {
    use recall_agent_model::ChatRole;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_create_chat_request() {
        let request = ChatRequest {
            model: "llama3.2:latest".to_owned(),
            messages: vec![
                ChatMessage::system("You are a helpful assistant."),
                ChatMessage::user("Hello"),
            ],
        };
        let value = serde_json::to_value(create_chat_request(&request)).unwrap();
        assert_eq!(
            value,
            json!({
                "model": "llama3.2:latest",
                "messages": [
                    { "role": "system", "content": "You are a helpful assistant." },
                    { "role": "user", "content": "Hello" }
                ],
                "stream": false
            })
        );
    }

    #[test]
    fn test_create_embeddings_request() {
        let request = EmbeddingRequest {
            model: "nomic-embed-text".to_owned(),
            prompt: "weather in London".to_owned(),
        };
        let value =
            serde_json::to_value(create_embeddings_request(&request)).unwrap();
        assert_eq!(
            value,
            json!({ "model": "nomic-embed-text", "prompt": "weather in London" })
        );
    }

    #[test]
    fn test_parse_responses() {
        let tags: TagsResponse = serde_json::from_value(json!({
            "models": [
                { "name": "llama3.2:latest", "modified_at": "2024-10-01T10:00:00Z", "size": 2019393189u64 },
                { "name": "mistral:7b" }
            ]
        }))
        .unwrap();
        let models = models_from_tags(tags);
        assert_eq!(models.len(), 2);
        assert_eq!(models[1].name, "mistral:7b");

        let completion: ChatCompletion = serde_json::from_value(json!({
            "model": "llama3.2:latest",
            "message": { "role": "assistant", "content": "Hi!" },
            "done": true
        }))
        .unwrap();
        assert_eq!(completion.message.role, ChatRole::Assistant);
        assert!(completion.done);

        let embedding: EmbeddingResponse =
            serde_json::from_value(json!({ "embedding": [0.5, -0.25] })).unwrap();
        assert_eq!(embedding.embedding, vec![0.5, -0.25]);
    }
}
